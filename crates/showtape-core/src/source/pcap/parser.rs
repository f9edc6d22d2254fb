use std::fs::File;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapNGReader, traits::PcapReaderIterator,
};

use crate::cancel::CancelToken;
use crate::source::{Datagram, DatagramSource, SourceError};

use super::error::CaptureError;
use super::layout;
use super::reader::{
    is_pcapng_magic, linktype_for_interface, pcapng_ts_to_seconds, read_magic_and_rewind,
};
use super::udp::parse_udp_payload;

/// Datagram source that replays UDP payloads from a capture file.
///
/// Receive times come from the capture timestamps, offset so the first
/// packet arrives at zero.
pub struct PcapFileSource {
    inner: PcapReader,
    first_ts: Option<f64>,
    skipped: u64,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

struct RawPacket {
    ts: f64,
    linktype: Linktype,
    data: Vec<u8>,
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(SourceError::from)?;
        let inner = create_reader(file).map_err(SourceError::from)?;
        info!("replaying capture {}", path.display());
        Ok(Self {
            inner,
            first_ts: None,
            skipped: 0,
        })
    }

    /// Frames skipped because they were not UDP or could not be sliced.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn relative(&mut self, ts: f64) -> Duration {
        let first = *self.first_ts.get_or_insert(ts);
        let offset = ts - first;
        if offset.is_finite() && offset > 0.0 {
            Duration::try_from_secs_f64(offset).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

impl DatagramSource for PcapFileSource {
    fn next_datagram(&mut self, cancel: &CancelToken) -> Result<Option<Datagram>, SourceError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let Some(packet) = next_packet(&mut self.inner).map_err(SourceError::from)? else {
                return Ok(None);
            };
            match parse_udp_payload(packet.linktype, &packet.data) {
                Ok(Some(payload)) => {
                    let data = payload.to_vec();
                    let at = self.relative(packet.ts);
                    return Ok(Some(Datagram { at, data }));
                }
                Ok(None) => self.skipped += 1,
                Err(err) => {
                    debug!("skipping undecodable frame: {err}");
                    self.skipped += 1;
                }
            }
        }
    }
}

fn create_reader(file: File) -> Result<PcapReader, CaptureError> {
    let mut file = file;
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file).map_err(|e| {
            CaptureError::Malformed {
                stage: "pcapng reader init",
                message: e.to_string(),
            }
        })?;
        Ok(PcapReader::Ng {
            reader,
            linktypes: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file).map_err(|e| {
            CaptureError::Malformed {
                stage: "pcap reader init",
                message: e.to_string(),
            }
        })?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
        })
    }
}

fn next_packet(reader: &mut PcapReader) -> Result<Option<RawPacket>, CaptureError> {
    loop {
        match reader {
            PcapReader::Legacy { reader, linktype } => match reader.next() {
                Ok((offset, block)) => {
                    let packet = match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            *linktype = Some(header.network);
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => Some(RawPacket {
                            ts: packet.ts_sec as f64 + packet.ts_usec as f64 / 1_000_000.0,
                            linktype: linktype.unwrap_or(Linktype::ETHERNET),
                            data: packet.data.to_vec(),
                        }),
                        _ => None,
                    };
                    reader.consume(offset);
                    if packet.is_some() {
                        return Ok(packet);
                    }
                }
                Err(pcap_parser::PcapError::Eof) => return Ok(None),
                Err(pcap_parser::PcapError::Incomplete(_)) => {
                    reader.refill().map_err(|e| CaptureError::Malformed {
                        stage: "pcap reader refill",
                        message: e.to_string(),
                    })?;
                }
                Err(e) => {
                    return Err(CaptureError::Malformed {
                        stage: "pcap reader next",
                        message: e.to_string(),
                    });
                }
            },
            PcapReader::Ng { reader, linktypes } => match reader.next() {
                Ok((offset, block)) => {
                    let packet = match block {
                        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                            linktypes.push(intf.linktype);
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(RawPacket {
                            ts: pcapng_ts_to_seconds(packet.ts_high, packet.ts_low),
                            linktype: linktype_for_interface(linktypes, packet.if_id),
                            data: packet.data.to_vec(),
                        }),
                        _ => None,
                    };
                    reader.consume(offset);
                    if packet.is_some() {
                        return Ok(packet);
                    }
                }
                Err(pcap_parser::PcapError::Eof) => return Ok(None),
                Err(pcap_parser::PcapError::Incomplete(_)) => {
                    reader.refill().map_err(|e| CaptureError::Malformed {
                        stage: "pcapng reader refill",
                        message: e.to_string(),
                    })?;
                }
                Err(e) => {
                    return Err(CaptureError::Malformed {
                        stage: "pcapng reader next",
                        message: e.to_string(),
                    });
                }
            },
        }
    }
}
