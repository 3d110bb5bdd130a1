//! Classification of simulated events by their true interaction channel

use serde::Serialize;

use std::fmt::{self, Display};

/// Interaction channel buckets of the histogram store
///
/// `All` is the inclusive bucket that every selected event also lands in. It
/// is never the outcome of a classification.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum Channel {
    /// Inclusive bucket
    All,
    /// Neutrino neutral-current quasi-elastic scattering
    NuNcQe,
    /// Antineutrino neutral-current quasi-elastic scattering
    NuBarNcQe,
    /// Neutral-current single pion production
    Nc1Pi,
    /// Any other neutral-current interaction
    NcOther,
    /// Charged-current quasi-elastic scattering
    CcQe,
    /// Charged-current 2p2h (meson exchange current)
    Cc2p2h,
    /// Interaction mode 0
    CcOther,
    /// Everything else
    Others,
}
//
impl Channel {
    /// Every bucket, in the order in which they are registered in the store
    pub const ALL: [Channel; 9] = [
        Channel::All,
        Channel::NuNcQe,
        Channel::NuBarNcQe,
        Channel::Nc1Pi,
        Channel::NcOther,
        Channel::CcQe,
        Channel::Cc2p2h,
        Channel::CcOther,
        Channel::Others,
    ];

    /// Classify an event from its NEUT interaction mode code
    ///
    /// Sign distinguishes neutrinos from antineutrinos. The order of the
    /// checks matters, the first matching rule wins.
    ///
    pub fn classify(mode: i32) -> Self {
        let abs_mode = mode.unsigned_abs();
        if mode == 51 || mode == 52 {
            Channel::NuNcQe
        } else if mode == -51 || mode == -52 {
            Channel::NuBarNcQe
        } else if abs_mode > 30 && abs_mode < 35 {
            Channel::Nc1Pi
        } else if abs_mode > 30 {
            Channel::NcOther
        } else if abs_mode == 1 {
            Channel::CcQe
        } else if abs_mode == 2 {
            Channel::Cc2p2h
        } else if mode == 0 {
            Channel::CcOther
        } else {
            Channel::Others
        }
    }

    /// Short name used in histogram names and output records
    pub fn name(self) -> &'static str {
        match self {
            Channel::All => "all",
            Channel::NuNcQe => "nuncqe",
            Channel::NuBarNcQe => "nubarncqe",
            Channel::Nc1Pi => "nc1pi",
            Channel::NcOther => "ncother",
            Channel::CcQe => "ccqe",
            Channel::Cc2p2h => "ccqe2p2h",
            Channel::CcOther => "ccother",
            Channel::Others => "others",
        }
    }
}

impl From<Channel> for &'static str {
    fn from(channel: Channel) -> Self {
        channel.name()
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
