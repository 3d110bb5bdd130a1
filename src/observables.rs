//! Histogrammed observables and the key spaces of the histogram stores
//!
//! Primary observables are filled once per selected event, candidate
//! observables once per selected neutron capture candidate. Each observable
//! carries its own binning and axis title.

use crate::{
    channel::Channel,
    event::{Candidate, SelectedEvent},
    evcut::CutStage,
    histogram::Binning,
    store::StoreKey,
};

use std::fmt::{self, Display};

/// Event selections that histograms are made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// NC gamma-ray (NCQE) selection
    NcGamma,
}
//
impl Selection {
    /// Every selection
    pub const ALL: [Selection; 1] = [Selection::NcGamma];

    /// Short name used in histogram names
    pub fn name(self) -> &'static str {
        match self {
            Selection::NcGamma => "ncgamma",
        }
    }
}

/// Cut stages after which histograms are made
pub const HISTOGRAMMED_STAGES: [CutStage; 1] = [CutStage::Angle];

/// Truth category of neutron capture candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Inclusive category
    All,
    /// Capture on gadolinium
    Gd,
    /// Capture on hydrogen
    H,
    /// Accidental background
    Noise,
}
//
impl Category {
    /// Every category, in registration order
    pub const ALL: [Category; 4] = [Category::All, Category::Gd, Category::H, Category::Noise];

    /// Number of categories
    pub const COUNT: usize = Self::ALL.len();

    /// Category of a candidate from its simulation truth label
    pub fn from_label(label: i32) -> Option<Self> {
        match label {
            0 => Some(Category::Noise),
            2 => Some(Category::H),
            3 => Some(Category::Gd),
            _ => None,
        }
    }

    /// Short name used in histogram names
    pub fn name(self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Gd => "Gd",
            Category::H => "H",
            Category::Noise => "Noise",
        }
    }

    /// Position in [`Category::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Observables of the primary event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptObservable {
    /// True neutrino energy
    TrueEnergy,
    /// Reconstructed energy
    RecoEnergy,
    /// Wall distance
    Dwall,
    /// Effective wall distance
    Effwall,
    /// Fit quality
    Ovaq,
    /// Cherenkov angle
    Angle,
    /// Cosine to the beam axis
    BeamCos,
    /// Vertex X
    X,
    /// Vertex Y
    Y,
    /// Vertex Z
    Z,
    /// Squared vertex radius
    R2,
    /// True neutron multiplicity
    TrueMultiplicity,
    /// Taggable neutron multiplicity
    TaggableMultiplicity,
    /// Tagged neutron multiplicity
    TaggedMultiplicity,
}
//
impl PromptObservable {
    /// Every primary observable, in registration order
    pub const ALL: [PromptObservable; 14] = [
        PromptObservable::TrueEnergy,
        PromptObservable::RecoEnergy,
        PromptObservable::Dwall,
        PromptObservable::Effwall,
        PromptObservable::Ovaq,
        PromptObservable::Angle,
        PromptObservable::BeamCos,
        PromptObservable::X,
        PromptObservable::Y,
        PromptObservable::Z,
        PromptObservable::R2,
        PromptObservable::TrueMultiplicity,
        PromptObservable::TaggableMultiplicity,
        PromptObservable::TaggedMultiplicity,
    ];

    /// Histogram name prefix
    pub fn name(self) -> &'static str {
        use PromptObservable::*;
        match self {
            TrueEnergy => "henu",
            RecoEnergy => "herec",
            Dwall => "hdwall",
            Effwall => "heffwall",
            Ovaq => "hovaq",
            Angle => "hangle",
            BeamCos => "hcosb",
            X => "hx",
            Y => "hy",
            Z => "hz",
            R2 => "hr2",
            TrueMultiplicity => "htrue_n",
            TaggableMultiplicity => "htaggable_n",
            TaggedMultiplicity => "htagged_n",
        }
    }

    /// Axis title
    pub fn title(self) -> &'static str {
        use PromptObservable::*;
        match self {
            TrueEnergy => "E_{#nu} [GeV]",
            RecoEnergy => "E_{rec} [GeV]",
            Dwall => "dwall [cm]",
            Effwall => "effwall [cm]",
            Ovaq => "OvaQ",
            Angle => "#theta_{c} [deg]",
            BeamCos => "#theta_{beam}",
            X => "X [cm]",
            Y => "Y [cm]",
            Z => "Z [cm]",
            R2 => "R^2 [cm]",
            TrueMultiplicity => "True MultiN",
            TaggableMultiplicity => "Taggable MultiN",
            TaggedMultiplicity => "Tagged MultiN",
        }
    }

    /// Histogram binning
    pub fn binning(self) -> Binning {
        use PromptObservable::*;
        match self {
            TrueEnergy => Binning::new(200, 0., 10.),
            RecoEnergy => Binning::new(26, 3.49, 29.49),
            Dwall => Binning::new(16, 200., 1800.),
            Effwall => Binning::new(23, 200., 4800.),
            Ovaq => Binning::new(24, -0.4, 0.8),
            Angle => Binning::new(33, 0., 90.),
            BeamCos => Binning::new(10, -1., 1.),
            X | Y => Binning::new(5, -20., 20.),
            Z => Binning::new(5, -16.5, 16.5),
            R2 => Binning::new(5, 0., 220.),
            TrueMultiplicity | TaggableMultiplicity | TaggedMultiplicity => {
                Binning::new(15, -0.5, 14.5)
            }
        }
    }

    /// Value of this observable for a selected event
    pub fn value(self, ev: &SelectedEvent) -> f64 {
        use PromptObservable::*;
        match self {
            TrueEnergy => ev.enu,
            RecoEnergy => ev.erec,
            Dwall => ev.dwall,
            Effwall => ev.effwall,
            Ovaq => ev.ovaq,
            Angle => ev.angle,
            BeamCos => ev.cosb,
            X => ev.pos_x,
            Y => ev.pos_y,
            Z => ev.pos_z,
            R2 => ev.pos_r2,
            TrueMultiplicity => ev.ntrue.into(),
            TaggableMultiplicity => ev.ntaggable.into(),
            TaggedMultiplicity => ev.ntagged.into(),
        }
    }
}

/// Kinematic observables of neutron capture candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeutronFeature {
    /// Capture time
    CaptureTime,
    /// Distance to the prompt vertex
    TravelDistance,
    /// Cosine between the prompt-to-capture direction and the beam
    BeamCos,
    /// Cosine between the prompt-to-capture direction and the prompt direction
    GammaCos,
    /// Travel distance times the beam cosine
    LongitudinalDistance,
    /// Travel distance times the gamma cosine
    TransverseDistance,
    /// Capture vertex X
    X,
    /// Capture vertex Y
    Y,
    /// Capture vertex Z
    Z,
    /// Squared capture vertex radius
    R2,
}
//
impl NeutronFeature {
    /// Every kinematic feature, in registration order
    pub const ALL: [NeutronFeature; 10] = [
        NeutronFeature::CaptureTime,
        NeutronFeature::TravelDistance,
        NeutronFeature::BeamCos,
        NeutronFeature::GammaCos,
        NeutronFeature::LongitudinalDistance,
        NeutronFeature::TransverseDistance,
        NeutronFeature::X,
        NeutronFeature::Y,
        NeutronFeature::Z,
        NeutronFeature::R2,
    ];

    /// Number of kinematic features
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`NeutronFeature::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Histogram name prefix
    pub fn name(self) -> &'static str {
        use NeutronFeature::*;
        match self {
            CaptureTime => "hntag_Tds",
            TravelDistance => "hntag_Dist",
            BeamCos => "hntag_BeamCos",
            GammaCos => "hntag_GaCos",
            LongitudinalDistance => "hntag_DistL",
            TransverseDistance => "hntag_DistT",
            X => "hntag_x",
            Y => "hntag_y",
            Z => "hntag_z",
            R2 => "hntag_r2",
        }
    }

    /// Axis title
    pub fn title(self) -> &'static str {
        use NeutronFeature::*;
        match self {
            CaptureTime => "Capture time[#mus]",
            TravelDistance => "Travel distance [cm]",
            BeamCos => "Cos#theta_{n#b}",
            GammaCos => "Cos#theta_{n#gamma}",
            LongitudinalDistance => "Longtitual dist. [cm]",
            TransverseDistance => "Transverse dist. [cm]",
            X => "X_n [m]",
            Y => "Y_n [m]",
            Z => "Z_n [m]",
            R2 => "R^2_n [m^2]",
        }
    }

    /// Histogram binning
    pub fn binning(self) -> Binning {
        use NeutronFeature::*;
        match self {
            CaptureTime => Binning::new(6, 0., 600.),
            TravelDistance => Binning::new(15, 0., 1500.),
            BeamCos | GammaCos => Binning::new(5, -1., 1.),
            LongitudinalDistance => Binning::new(13, -650., 650.),
            TransverseDistance => Binning::new(16, 0., 1600.),
            X | Y => Binning::new(5, -20., 20.),
            Z => Binning::new(5, -18., 18.),
            R2 => Binning::new(7, 0., 280.),
        }
    }
}

/// Inputs of the neutron tagging network, histogrammed without channel split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NnFeature {
    NHits,
    NResHits,
    Trms,
    Dwall,
    DwallMeanDir,
    Beta1,
    Beta2,
    Beta3,
    Beta4,
    Beta5,
    OpeningAngleMean,
    OpeningAngleSkew,
    OpeningAngleStdev,
    MeanDirAngleMean,
    MeanDirAngleRms,
    BurstRatio,
    FitGoodness,
    DarkLikelihood,
    TagOut,
}
//
impl NnFeature {
    /// Every network input, in registration order
    pub const ALL: [NnFeature; 19] = [
        NnFeature::NHits,
        NnFeature::NResHits,
        NnFeature::Trms,
        NnFeature::Dwall,
        NnFeature::DwallMeanDir,
        NnFeature::Beta1,
        NnFeature::Beta2,
        NnFeature::Beta3,
        NnFeature::Beta4,
        NnFeature::Beta5,
        NnFeature::OpeningAngleMean,
        NnFeature::OpeningAngleSkew,
        NnFeature::OpeningAngleStdev,
        NnFeature::MeanDirAngleMean,
        NnFeature::MeanDirAngleRms,
        NnFeature::BurstRatio,
        NnFeature::FitGoodness,
        NnFeature::DarkLikelihood,
        NnFeature::TagOut,
    ];

    /// Number of network inputs
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`NnFeature::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Histogram name prefix
    pub fn name(self) -> &'static str {
        use NnFeature::*;
        match self {
            NHits => "hntag_NHits",
            NResHits => "hntag_NResHits",
            Trms => "hntag_TRMS",
            Dwall => "hntag_DWall",
            DwallMeanDir => "hntag_DWallDir",
            Beta1 => "hntag_B1",
            Beta2 => "hntag_B2",
            Beta3 => "hntag_B3",
            Beta4 => "hntag_B4",
            Beta5 => "hntag_B5",
            OpeningAngleMean => "hntag_AngleMean",
            OpeningAngleSkew => "hntag_AngleSkew",
            OpeningAngleStdev => "hntag_AngleStdev",
            MeanDirAngleMean => "hntag_DirAngleMean",
            MeanDirAngleRms => "hntag_DirAngleRMS",
            BurstRatio => "hntag_BRatio",
            FitGoodness => "hntag_FitGood",
            DarkLikelihood => "hntag_DarkLikl",
            TagOut => "hntag_TagOut",
        }
    }

    /// Axis title
    pub fn title(self) -> &'static str {
        use NnFeature::*;
        match self {
            NHits => "NHits",
            NResHits => "NResHits",
            Trms => "TRMS     [ns]",
            Dwall => "DWall    [cm]",
            DwallMeanDir => "DWallDir [cm]",
            Beta1 => "Beta 1",
            Beta2 => "Beta 2",
            Beta3 => "Beta 3",
            Beta4 => "Beta 4",
            Beta5 => "Beta 5",
            OpeningAngleMean => "AngleMean [deg]",
            OpeningAngleSkew => "AngleSkew [deg]",
            OpeningAngleStdev => "AngleStedv[deg]",
            MeanDirAngleMean => "DirAngleMean[deg]",
            MeanDirAngleRms => "DirAngleRMS[deg]",
            BurstRatio => "Brust Ratio",
            FitGoodness => "Fit Goodness",
            DarkLikelihood => "Dark Likelihood",
            TagOut => "NN TagOut",
        }
    }

    /// Histogram binning
    pub fn binning(self) -> Binning {
        use NnFeature::*;
        match self {
            NHits => Binning::new(30, 0., 60.),
            NResHits => Binning::new(40, 0., 80.),
            Trms => Binning::new(20, 0., 10.),
            Dwall => Binning::new(20, -400., 1600.),
            DwallMeanDir => Binning::new(20, 0., 5000.),
            Beta1 => Binning::new(20, -0.4, 1.),
            Beta2 | Beta3 | Beta4 | Beta5 => Binning::new(70, -0.4, 1.),
            OpeningAngleMean => Binning::new(30, 20., 80.),
            OpeningAngleSkew => Binning::new(50, -150., 150.),
            OpeningAngleStdev => Binning::new(40, 10., 30.),
            MeanDirAngleMean => Binning::new(35, 20., 90.),
            MeanDirAngleRms => Binning::new(30, 0., 60.),
            BurstRatio | DarkLikelihood | TagOut => Binning::new(20, 0., 1.),
            FitGoodness => Binning::new(40, 0., 1.),
        }
    }

    /// Value of this network input for a candidate
    pub fn value(self, candidate: &Candidate) -> f64 {
        use NnFeature::*;
        let fit = &candidate.fit;
        match self {
            NHits => fit.n_hits,
            NResHits => fit.n_res_hits,
            Trms => fit.trms,
            Dwall => fit.dwall,
            DwallMeanDir => fit.dwall_mean_dir,
            Beta1 => fit.beta[0],
            Beta2 => fit.beta[1],
            Beta3 => fit.beta[2],
            Beta4 => fit.beta[3],
            Beta5 => fit.beta[4],
            OpeningAngleMean => fit.opening_angle_mean,
            OpeningAngleSkew => fit.opening_angle_skew,
            OpeningAngleStdev => fit.opening_angle_stdev,
            MeanDirAngleMean => fit.mean_dir_angle_mean,
            MeanDirAngleRms => fit.mean_dir_angle_rms,
            BurstRatio => fit.burst_ratio,
            FitGoodness => fit.fit_goodness,
            DarkLikelihood => fit.dark_likelihood,
            TagOut => candidate.tag_out,
        }
    }
}

/// Key of the primary observable histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptKey {
    /// Histogrammed observable
    pub observable: PromptObservable,
    /// Event selection
    pub selection: Selection,
    /// Cut stage
    pub stage: CutStage,
    /// Interaction channel bucket
    pub channel: Channel,
}
//
impl PromptKey {
    /// Every key, as the Cartesian product of all dimensions
    pub fn all() -> impl Iterator<Item = Self> {
        PromptObservable::ALL.into_iter().flat_map(|observable| {
            Selection::ALL.into_iter().flat_map(move |selection| {
                HISTOGRAMMED_STAGES.into_iter().flat_map(move |stage| {
                    Channel::ALL.into_iter().map(move |channel| Self {
                        observable,
                        selection,
                        stage,
                        channel,
                    })
                })
            })
        })
    }
}
//
impl Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.observable.name(),
            self.selection.name(),
            self.stage,
            self.channel
        )
    }
}
//
impl StoreKey for PromptKey {
    fn binning(&self) -> Binning {
        self.observable.binning()
    }

    fn title(&self) -> &'static str {
        self.observable.title()
    }
}

/// Key of the candidate kinematics histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeutronKey {
    /// Histogrammed feature
    pub feature: NeutronFeature,
    /// Truth category of the candidate
    pub category: Category,
    /// Cut stage of the primary event
    pub stage: CutStage,
    /// Interaction channel bucket of the primary event
    pub channel: Channel,
}
//
impl NeutronKey {
    /// Every key, as the Cartesian product of all dimensions
    pub fn all() -> impl Iterator<Item = Self> {
        NeutronFeature::ALL.into_iter().flat_map(|feature| {
            Category::ALL.into_iter().flat_map(move |category| {
                HISTOGRAMMED_STAGES.into_iter().flat_map(move |stage| {
                    Channel::ALL.into_iter().map(move |channel| Self {
                        feature,
                        category,
                        stage,
                        channel,
                    })
                })
            })
        })
    }
}
//
impl Display for NeutronKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.feature.name(),
            self.category.name(),
            self.stage,
            self.channel
        )
    }
}
//
impl StoreKey for NeutronKey {
    fn binning(&self) -> Binning {
        self.feature.binning()
    }

    fn title(&self) -> &'static str {
        self.feature.title()
    }
}

/// Key of the tagging network input histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NnKey {
    /// Histogrammed network input
    pub feature: NnFeature,
    /// Truth category of the candidate
    pub category: Category,
    /// Cut stage of the primary event
    pub stage: CutStage,
}
//
impl NnKey {
    /// Every key, as the Cartesian product of all dimensions
    pub fn all() -> impl Iterator<Item = Self> {
        NnFeature::ALL.into_iter().flat_map(|feature| {
            Category::ALL.into_iter().flat_map(move |category| {
                HISTOGRAMMED_STAGES.into_iter().map(move |stage| Self {
                    feature,
                    category,
                    stage,
                })
            })
        })
    }
}
//
impl Display for NnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.feature.name(),
            self.category.name(),
            self.stage
        )
    }
}
//
impl StoreKey for NnKey {
    fn binning(&self) -> Binning {
        self.feature.binning()
    }

    fn title(&self) -> &'static str {
        self.feature.title()
    }
}
