//! Built-in adapters, one module per source kind.

mod ard;
mod astra;
mod dvb_t2_de;
mod dvbsi;
mod enigma2;
mod jsonapi;
mod m3u;
mod neutrino;
mod simplitv_at;
mod vodafone_de;
mod wilhelm_tel_de;

pub use ard::ArdAdapter;
pub use astra::AstraAdapter;
pub use dvb_t2_de::DvbT2DeAdapter;
pub use dvbsi::DvbSiAdapter;
pub use enigma2::Enigma2Adapter;
pub use jsonapi::JsonApiAdapter;
pub use m3u::M3uAdapter;
pub use neutrino::NeutrinoAdapter;
pub use simplitv_at::SimpliTvAtAdapter;
pub use vodafone_de::{VODAFONE_BLOCKED_MESSAGE, VodafoneDeAdapter};
pub use wilhelm_tel_de::WilhelmTelDeAdapter;
