//! End-to-end checks of the event selection and histogramming

use ncqe_select::{
    channel::Channel,
    config::{AnalysisMode, AnalysisTables, Flavor, RunConfiguration, RunPeriod},
    evcut::{CutStage, SelectionCuts},
    event::{Candidate, CandidateFit, Event, NeutronMultiplicity},
    fluxtune::FluxTune,
    linalg::{Direction, Position},
    observables::{
        Category, NeutronFeature, NeutronKey, NnFeature, NnKey, PromptKey, PromptObservable,
        Selection,
    },
    pipeline::EventPipeline,
    resacc::AccumulatorOptions,
    resfin::FinalResults,
    source::{self, EventRecord},
};

use approx::assert_relative_eq;

/// Reference event, which passes the selection in mode 6 with cut run "11"
fn reference_event() -> Event {
    Event {
        true_energy: 6.,
        reco_energy: 10.,
        dwall: 600.,
        effwall: 2500.,
        ovaq: 0.2,
        angle: 40.,
        vertex: Position::new(1., 2., 3.),
        true_vertex: Position::new(1.1, 2.1, 2.9),
        direction: Direction::new(0., 0., 1.),
        interaction_mode: 51,
        multiplicity: NeutronMultiplicity {
            truth: 2,
            taggable: 2,
            tagged: 1,
        },
        candidates: Vec::new(),
    }
}

fn candidate(label: i32, position: Position) -> Candidate {
    Candidate {
        tag_out: 0.95,
        label,
        position,
        capture_time: 150.,
        travel_distance: 250.,
        fit: CandidateFit {
            n_hits: 9.,
            fit_goodness: 0.6,
            ..CandidateFit::default()
        },
    }
}

fn setup(mode: u8) -> (RunConfiguration, SelectionCuts) {
    let tables = AnalysisTables::builtin().unwrap();
    let cfg = RunConfiguration::new(&tables, AnalysisMode(mode), None).unwrap();
    let cuts = SelectionCuts::new(&tables, &RunPeriod::from("11"), AnalysisMode(mode)).unwrap();
    (cfg, cuts)
}

fn analyze(
    cfg: &RunConfiguration,
    cuts: &SelectionCuts,
    flavor: Flavor,
    options: AccumulatorOptions,
    records: &[EventRecord],
) -> FinalResults {
    EventPipeline::new(cfg, cuts, flavor, options)
        .unwrap()
        .run(records)
        .finalize()
}

fn prompt_key(observable: PromptObservable, channel: Channel) -> PromptKey {
    PromptKey {
        observable,
        selection: Selection::NcGamma,
        stage: CutStage::Angle,
        channel,
    }
}

/// Every histogram of the results, flattened for exact comparisons
fn snapshot(res: &FinalResults) -> Vec<(String, Vec<u64>, Vec<u64>, Vec<u64>)> {
    res.histograms()
        .map(|named| {
            let hist = named.histogram;
            let slots = 0..hist.binning().bins + 2;
            (
                named.name,
                slots.clone().map(|s| hist.entries(s)).collect(),
                slots.clone().map(|s| hist.sum_weights(s).to_bits()).collect(),
                slots.map(|s| hist.sum_weights2(s).to_bits()).collect(),
            )
        })
        .collect()
}

#[test]
fn reference_event_fills_its_channel_for_every_run() {
    let (cfg, cuts) = setup(6);
    let res = analyze(
        &cfg,
        &cuts,
        Flavor::Numu,
        AccumulatorOptions::default(),
        &[Ok(reference_event())],
    );
    assert_eq!(res.cut_flow.accepted(), 1);
    assert_eq!(res.selected[0].channel, Channel::NuNcQe);

    // Expected weights, accumulated in run order like the histograms do
    let scale = 2.42246e-18;
    let (sumw, sumw2) = cfg.runs().fold((0., 0.), |(w, w2), (_, pot)| {
        let weight = scale * pot / 100_000.;
        (w + weight, w2 + weight * weight)
    });
    assert_relative_eq!(sumw, scale * 1.76e20 / 100_000., max_relative = 1e-12);

    // True energy 6 MeV lands in bin 120 of henu, i.e. slot 121
    for channel in [Channel::NuNcQe, Channel::All] {
        let henu = res
            .prompt
            .get(&prompt_key(PromptObservable::TrueEnergy, channel))
            .unwrap();
        assert_eq!(henu.entries(121), cfg.num_runs() as u64);
        assert_eq!(henu.sum_weights(121), sumw);
        assert_eq!(henu.sum_weights2(121), sumw2);
        assert_eq!(henu.total_entries(), cfg.num_runs() as u64);
    }
    for channel in Channel::ALL {
        if channel == Channel::NuNcQe || channel == Channel::All {
            continue;
        }
        for observable in PromptObservable::ALL {
            let hist = res.prompt.get(&prompt_key(observable, channel)).unwrap();
            assert_eq!(hist.total_entries(), 0, "{observable:?} {channel}");
        }
    }
}

#[test]
fn channel_and_inclusive_buckets_get_the_same_deltas() {
    let (cfg, cuts) = setup(4);
    let mut event = reference_event();
    event.interaction_mode = 33;
    event.reco_energy = 12.;
    event.angle = 45.;
    event.candidates = vec![
        candidate(3, Position::new(2., 2., 3.)),
        candidate(2, Position::new(1., 0., 3.)),
    ];
    let res = analyze(
        &cfg,
        &cuts,
        Flavor::Numubar,
        AccumulatorOptions::default(),
        &[Ok(event)],
    );
    assert_eq!(cfg.num_runs(), 13);
    assert_eq!(res.selected[0].channel, Channel::Nc1Pi);
    for observable in PromptObservable::ALL {
        let own = res.prompt.get(&prompt_key(observable, Channel::Nc1Pi));
        let all = res.prompt.get(&prompt_key(observable, Channel::All));
        assert_eq!(own, all);
        assert_eq!(own.unwrap().total_entries(), 13);
    }
    for category in Category::ALL {
        for feature in NeutronFeature::ALL {
            let key = |channel| NeutronKey {
                feature,
                category,
                stage: CutStage::Angle,
                channel,
            };
            let own = res.neutron.get(&key(Channel::Nc1Pi)).unwrap();
            let all = res.neutron.get(&key(Channel::All)).unwrap();
            assert_eq!(own, all);
            let expected = match category {
                Category::All => 2 * 13,
                Category::Gd | Category::H => 13,
                Category::Noise => 0,
            };
            assert_eq!(own.total_entries(), expected, "{category:?} {feature:?}");
        }
    }
}

#[test]
fn replaying_the_analysis_is_bitwise_reproducible() {
    let (cfg, cuts) = setup(6);
    let options = AccumulatorOptions {
        nn_histograms: true,
        legacy_nn_double_fill: false,
    };
    let records = (0..25_000)
        .map(|i| {
            let mut event = reference_event();
            event.reco_energy = 4. + f64::from(i % 260) * 0.1;
            event.angle = 20. + f64::from(i % 70);
            event.true_energy = 0.5 + f64::from(i % 97) * 0.1;
            event.interaction_mode = [51, -52, 31, 40, 1, -2, 0, 27][i as usize % 8];
            event.candidates = vec![candidate(2 + (i % 2), Position::new(5., -4., 1.))];
            Ok(event)
        })
        .collect::<Vec<_>>();
    let res1 = analyze(&cfg, &cuts, Flavor::Numu, options, &records);
    let res2 = analyze(&cfg, &cuts, Flavor::Numu, options, &records);
    assert!(res1.cut_flow.accepted() > 0);
    assert!(res1.cut_flow.rejected(CutStage::Angle) > 0);
    assert_eq!(snapshot(&res1), snapshot(&res2));
    assert_eq!(res1.selected, res2.selected);
    assert_eq!(res1.cut_flow, res2.cut_flow);
}

#[test]
fn rejected_events_leave_no_trace_in_histograms() {
    let (cfg, cuts) = setup(6);
    let mut event = reference_event();
    event.reco_energy = 30.;
    let res = analyze(
        &cfg,
        &cuts,
        Flavor::Numu,
        AccumulatorOptions::default(),
        &[Ok(event)],
    );
    assert_eq!(res.cut_flow.rejected(CutStage::Energy), 1);
    assert!(res.selected.is_empty());
    assert!(res
        .histograms()
        .all(|named| named.histogram.total_entries() == 0));
}

#[test]
fn failing_events_leave_no_partial_fills() {
    let (cfg, cuts) = setup(6);
    let options = AccumulatorOptions {
        nn_histograms: true,
        legacy_nn_double_fill: false,
    };
    let mut failing = reference_event();
    failing.candidates = vec![
        candidate(3, Position::new(4., 4., 4.)),
        candidate(2, failing.vertex),
    ];
    let res = analyze(&cfg, &cuts, Flavor::Numu, options, &[Ok(failing)]);
    assert_eq!(res.failed_events, 1);
    assert_eq!(res.cut_flow.total(), 0);
    assert!(res
        .histograms()
        .all(|named| named.histogram.total_entries() == 0));
}

#[test]
fn legacy_double_fill_only_affects_network_histograms() {
    let (cfg, cuts) = setup(6);
    let mut event = reference_event();
    event.candidates = vec![candidate(0, Position::new(3., 2., 3.))];
    let records = [Ok(event)];
    let single = AccumulatorOptions {
        nn_histograms: true,
        legacy_nn_double_fill: false,
    };
    let double = AccumulatorOptions {
        nn_histograms: true,
        legacy_nn_double_fill: true,
    };
    let res1 = analyze(&cfg, &cuts, Flavor::Numu, single, &records);
    let res2 = analyze(&cfg, &cuts, Flavor::Numu, double, &records);

    let key = NnKey {
        feature: NnFeature::FitGoodness,
        category: Category::Noise,
        stage: CutStage::Angle,
    };
    let runs = cfg.num_runs() as u64;
    let nn1 = res1.network.as_ref().unwrap().get(&key).unwrap();
    let nn2 = res2.network.as_ref().unwrap().get(&key).unwrap();
    assert_eq!(nn1.total_entries(), runs);
    assert_eq!(nn2.total_entries(), 2 * runs);
    assert_eq!(
        res1.prompt.get(&prompt_key(PromptObservable::Angle, Channel::All)),
        res2.prompt.get(&prompt_key(PromptObservable::Angle, Channel::All))
    );
}

#[test]
fn flux_reweighting_scales_weights_per_run() {
    let (mut cfg, cuts) = setup(6);
    let run = RunPeriod::from("11");
    let plain = analyze(
        &cfg,
        &cuts,
        Flavor::Numu,
        AccumulatorOptions::default(),
        &[Ok(reference_event())],
    );
    cfg.set_flux_tune(&run, Flavor::Numu, FluxTune::new(0., 12., vec![0.5, 2.]).unwrap());
    let tuned = analyze(
        &cfg,
        &cuts,
        Flavor::Numu,
        AccumulatorOptions::default(),
        &[Ok(reference_event())],
    );
    let key = prompt_key(PromptObservable::RecoEnergy, Channel::All);
    let w_plain = plain.prompt.get(&key).unwrap().total_weight();
    let w_tuned = tuned.prompt.get(&key).unwrap().total_weight();
    // 6 MeV falls in the upper bin of the table, in mode 6 run "11" is the only run
    assert_eq!(cfg.num_runs(), 1);
    assert_relative_eq!(w_tuned, 2. * w_plain, max_relative = 1e-12);
}

#[test]
fn records_flow_from_text_to_histograms() {
    let (cfg, cuts) = setup(6);
    let line = r#"{"pnu": 6.0, "erec": 10.51, "wall": 600.0, "effwall": 2500.0, "ovaq": 0.2, "angle": 40.0, "pos": [100.0, 200.0, 300.0], "posv": [100.0, 200.0, 300.0], "bdir": [0.0, 0.0, 1.0], "Neutmode": -51, "NTrueN": 1, "NTaggableN": 1, "NTaggedN": 1}"#;
    let records = vec![source::parse_record(line), source::parse_record("{}")];
    let res = analyze(
        &cfg,
        &cuts,
        Flavor::Nuebar,
        AccumulatorOptions::default(),
        &records,
    );
    assert_eq!(res.failed_events, 1);
    assert_eq!(res.cut_flow.accepted(), 1);
    let selected = &res.selected[0];
    assert_eq!(selected.channel, Channel::NuBarNcQe);
    assert_eq!(selected.flavor, Flavor::Nuebar);
    assert_eq!(selected.pos_x, 1.);
    assert_eq!(selected.cosb, 0.024223);
}
