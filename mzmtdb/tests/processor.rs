#![allow(clippy::missing_panics_doc, clippy::float_cmp)]
//! Integration tests for building databases
use context_error::*;
use itertools::Itertools;
use mzmtdb::{
    AlignmentModel, CleavageState, EvidenceMap, ProteinInformation, RecordingObserver,
    RetentionTimePredictorType, TerminusState, apply_residuals, prelude::*,
};
use mzwarp::Residual;

const PROTON: f64 = 1.007_276_466_621;

fn xtandem(sequence: &str, scan: usize, predicted_net: f64) -> Evidence {
    let mut evidence = Evidence::new(
        sequence,
        2,
        scan,
        ToolScores::XTandem {
            hyperscore: 60.0,
            log_peptide_e_value: -8.0,
            num_tryptic_ends: 2,
        },
    );
    evidence.predicted_net = predicted_net;
    evidence.observed_net = predicted_net;
    evidence
}

fn msalign(sequence: &str, scan: usize, net: f64, mass: f64, charge: isize) -> Evidence {
    let mut evidence = Evidence::new(
        sequence,
        charge,
        scan,
        ToolScores::MsAlign {
            e_value: 1e-9,
            p_value: 1e-11,
            fdr: 0.0,
        },
    );
    evidence.observed_net = net;
    evidence.monoisotopic_mass = mass;
    evidence.theoretical_monoisotopic_mass = mass;
    evidence.mz = (charge as f64).mul_add(PROTON, mass) / charge as f64;
    evidence
}

fn all_ids(database: &TargetDatabase) -> Vec<usize> {
    database
        .evidence()
        .filter_map(|e| e.id)
        .sorted_unstable()
        .collect()
}

/// Proteins of all members end up on the target, each only once
#[test]
fn proteins_are_merged() {
    let protein = |name: &str| ProteinInformation {
        protein_name: name.to_string(),
        cleavage_state: CleavageState::Full,
        terminus_state: TerminusState::None,
        residue_start: 66,
        residue_end: 75,
    };
    let mut first = xtandem("LVNELTEFAK", 100, 0.4);
    first.proteins = vec![protein("ALBU_BOVIN")];
    let mut second = xtandem("LVNELTEFAK", 250, 0.4);
    second.proteins = vec![protein("ALBU_BOVIN"), protein("ALBU_HUMAN")];
    second.multi_protein_count = 2;
    let mut data_sets = vec![
        LcmsDataSet::new(
            "QC_01_xt.txt",
            LcmsIdentificationTool::XTandem,
            vec![first, xtandem("HLVDEPQNLIK", 300, 0.8)],
        ),
        LcmsDataSet::new(
            "QC_02_xt.txt",
            LcmsIdentificationTool::XTandem,
            vec![second, xtandem("HLVDEPQNLIK", 650, 0.8)],
        ),
    ];
    let database = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();

    let shared = database
        .iter()
        .find(|t| t.clean_sequence == "LVNELTEFAK")
        .unwrap();
    assert_eq!(
        shared.proteins,
        vec![protein("ALBU_BOVIN"), protein("ALBU_HUMAN")]
    );
    assert_eq!(shared.evidence[1].proteins.len(), 2);
    let other = database
        .iter()
        .find(|t| t.clean_sequence == "HLVDEPQNLIK")
        .unwrap();
    assert!(other.proteins.is_empty());
    assert_eq!(
        database.proteins().into_iter().collect_vec(),
        vec!["ALBU_BOVIN", "ALBU_HUMAN"]
    );
    assert_eq!(data_sets[1].evidence[0].proteins.len(), 2);
}

/// Two datasets share a peptide at different scans with the same predicted NET
#[test]
fn shared_peptide() {
    let mut data_sets = vec![
        LcmsDataSet::new(
            "QC_01_xt.txt",
            LcmsIdentificationTool::XTandem,
            vec![xtandem("LVNELTEFAK", 100, 0.4), xtandem("HLVDEPQNLIK", 300, 0.8)],
        ),
        LcmsDataSet::new(
            "QC_02_xt.txt",
            LcmsIdentificationTool::XTandem,
            vec![xtandem("LVNELTEFAK", 250, 0.4), xtandem("HLVDEPQNLIK", 650, 0.8)],
        ),
    ];
    let mut observer = RecordingObserver::default();
    let database = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut observer)
        .unwrap();

    let shared = database
        .iter()
        .find(|t| t.clean_sequence == "LVNELTEFAK")
        .unwrap();
    assert_eq!(shared.evidence.len(), 2);
    assert_eq!(shared.statistics.data_sets, 2);
    assert!((shared.statistics.average_net - 0.4).abs() < 1e-9);
    assert!(shared.statistics.net_stdev < 1e-9);

    let first = data_sets[0].alignment.as_ref().unwrap().regression().unwrap();
    let second = data_sets[1].alignment.as_ref().unwrap().regression().unwrap();
    assert!(!first.degenerate && !second.degenerate);
    assert!((first.transform(100.0) - 0.4).abs() < 1e-9);
    assert!((second.transform(250.0) - 0.4).abs() < 1e-9);
    assert!((first.transform(100.0) - second.transform(250.0)).abs() < 1e-9);

    assert_eq!(observer.alignments.len(), 1);
    assert_eq!(observer.alignments[0].len(), 2);
    assert_eq!(
        observer.progress.iter().map(|p| (p.0, p.1)).collect_vec(),
        vec![(1, 2), (2, 2)]
    );
}

/// Modified evidence is admitted but not used to fit the alignment
#[test]
fn modified_evidence_is_not_an_anchor() {
    let mut modified = xtandem("MPEPTIDEK", 200, 0.5);
    modified.modification_count = 1;
    modified.modification_description = "Oxidation@M1".to_string();
    let mut rejected = xtandem("AAAAK", 150, 0.2);
    rejected.scores = ToolScores::XTandem {
        hyperscore: 10.0,
        log_peptide_e_value: -1.0,
        num_tryptic_ends: 2,
    };
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_xt.txt",
        LcmsIdentificationTool::XTandem,
        vec![
            xtandem("LVNELTEFAK", 100, 0.3),
            modified,
            xtandem("HLVDEPQNLIK", 300, 0.7),
            rejected,
        ],
    )];
    let database = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();

    assert_eq!(database.evidence_count(), 3);
    assert_eq!(data_sets[0].evidence.len(), 3);
    let alignment = data_sets[0].alignment.as_ref().unwrap();
    assert_eq!(alignment.anchors, 2);
    assert_eq!(alignment.regression().unwrap().points, 2);
    let modified = database
        .iter()
        .find(|t| t.modification_count == 1)
        .unwrap();
    // Not an anchor, but still corrected with the fitted regression: 0.002 * 200 + 0.1
    assert!((modified.evidence[0].observed_net - 0.5).abs() < 1e-9);
    assert!(database.peptides().iter().all(|p| *p != "AAAAK"));
}

/// A duplicate evidence id in the evidence map is a hard failure
#[test]
fn duplicate_evidence() {
    let mut first = xtandem("LVNELTEFAK", 100, 0.3);
    first.id = Some(7);
    first.data_set = Some(0);
    let mut second = xtandem("LVNELTEFAK", 120, 0.3);
    second.id = Some(7);
    second.data_set = Some(1);
    let mut map = EvidenceMap::default();
    map.insert(first).unwrap();
    let error = map.insert(second).unwrap_err();
    assert_eq!(error.get_kind(), MtdbError::DuplicateEvidence);
}

#[test]
fn misaligned_residuals() {
    let mut evidence = vec![xtandem("LVNELTEFAK", 100, 0.3), xtandem("AAK", 50, 0.1)];
    evidence[0].id = Some(1);
    evidence[1].id = Some(2);
    let residuals = vec![
        Residual {
            id: 1,
            scan: 100,
            net: 0.3,
            mass_correction: 0.0,
        },
        Residual {
            id: 3,
            scan: 50,
            net: 0.1,
            mass_correction: 0.0,
        },
    ];
    let error = apply_residuals(&mut evidence, residuals).unwrap_err();
    assert_eq!(error.get_kind(), MtdbError::MisalignedResiduals);
}

#[test]
fn ids_are_dense_and_conserved() {
    let peptides = ["AAK", "CCK", "DDK", "EEK", "FFK", "GGK"];
    let mut data_sets = (0..3)
        .map(|set| {
            LcmsDataSet::new(
                format!("QC_{set:02}_xt.txt"),
                LcmsIdentificationTool::XTandem,
                peptides
                    .iter()
                    .enumerate()
                    .skip(set)
                    .map(|(index, peptide)| {
                        xtandem(peptide, 100 * (index + 1) + 7 * set, 0.1 * (index + 1) as f64)
                    })
                    .collect(),
            )
        })
        .collect_vec();
    let database = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();

    assert!(database.validate().is_ok());
    assert_eq!(database.len(), 6);
    let ids = all_ids(&database);
    assert_eq!(ids, (1..=15).collect_vec());
    let data_set_ids = data_sets
        .iter()
        .flat_map(|d| d.evidence.iter().filter_map(|e| e.id))
        .sorted_unstable()
        .collect_vec();
    assert_eq!(ids, data_set_ids);
    for target in &database {
        for evidence in &target.evidence {
            let in_data_set = data_sets[evidence.data_set.unwrap()]
                .evidence
                .iter()
                .find(|e| e.id == evidence.id)
                .unwrap();
            assert_eq!(in_data_set, evidence);
        }
    }
}

#[test]
fn single_anchor_is_not_corrected() {
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_xt.txt",
        LcmsIdentificationTool::XTandem,
        vec![xtandem("LVNELTEFAK", 100, 0.3)],
    )];
    data_sets[0].evidence[0].observed_net = 0.123;
    let database = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();
    let alignment = data_sets[0].alignment.as_ref().unwrap();
    assert!(alignment.is_degenerate());
    assert_eq!(alignment.regression().unwrap().points, 1);
    assert_eq!(database.consensus_targets[0].evidence[0].observed_net, 0.123);
}

#[test]
fn inconsistent_data_set() {
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_syn.txt",
        LcmsIdentificationTool::Sequest,
        vec![xtandem("LVNELTEFAK", 100, 0.3)],
    )];
    let original = data_sets.clone();
    let error = Processor::new(Options::default())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap_err();
    assert_eq!(error.get_kind(), MtdbError::InconsistentDataSet);
    assert_eq!(data_sets, original);
}

#[test]
fn unsupported_predictor() {
    let error = Processor::new(Options {
        predictor_type: RetentionTimePredictorType::Kangas,
        ..Options::default()
    })
    .unwrap_err();
    assert_eq!(error.get_kind(), MtdbError::UnsupportedOption);
}

#[test]
fn predicted_nets() {
    let processor = Processor::new(Options::default()).unwrap();
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_xt.txt",
        LcmsIdentificationTool::XTandem,
        vec![xtandem("GSKDEK", 100, 0.0), xtandem("LLFWIVLK", 300, 0.0)],
    )];
    processor.predict_nets(&mut data_sets);
    assert!(data_sets[0].evidence[0].predicted_net < data_sets[0].evidence[1].predicted_net);
}

fn top_down_options() -> Options {
    Options {
        workflow: TargetWorkflowType::TopDown,
        ..Options::default()
    }
}

fn proteoforms(shift: f64, ppm: f64) -> Vec<Evidence> {
    (0..8)
        .map(|i| {
            let mass = 1000.0f64.mul_add(f64::from(i), 10_000.0) * (1.0 + ppm * 1e-6);
            let mut evidence = msalign(
                &format!("MKLV{}", "A".repeat(i as usize + 1)),
                100 + 50 * i as usize,
                f64::from(i) / 7.0 + shift,
                mass,
                8,
            );
            evidence.theoretical_monoisotopic_mass = 1000.0f64.mul_add(f64::from(i), 10_000.0);
            evidence
        })
        .collect()
}

#[test]
fn top_down_single_data_set() {
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_MSAlign_syn.txt",
        LcmsIdentificationTool::MsAlign,
        proteoforms(0.0, 0.0),
    )];
    let original = data_sets[0].evidence.clone();
    let mut observer = RecordingObserver::default();
    let database = Processor::new(top_down_options())
        .unwrap()
        .process(&mut data_sets, &mut observer)
        .unwrap();

    assert_eq!(database.len(), 8);
    let alignment = data_sets[0].alignment.as_ref().unwrap();
    assert!(!alignment.is_degenerate());
    assert!(matches!(alignment.model, AlignmentModel::Warp(_)));
    assert_eq!(alignment.warp().unwrap().residuals.len(), 8);
    for evidence in &data_sets[0].evidence {
        let before = original
            .iter()
            .find(|e| e.clean_peptide == evidence.clean_peptide)
            .unwrap();
        assert!((evidence.observed_net - before.observed_net).abs() < 1e-6);
        assert!((evidence.monoisotopic_mass - before.monoisotopic_mass).abs() < 1e-6);
    }
    assert_eq!(observer.alignments.len(), 1);
}

#[test]
fn top_down_two_data_sets() {
    let mut data_sets = vec![
        LcmsDataSet::new(
            "QC_01_MSAlign_syn.txt",
            LcmsIdentificationTool::MsAlign,
            proteoforms(0.0, 0.0),
        ),
        LcmsDataSet::new(
            "QC_02_MSAlign_syn.txt",
            LcmsIdentificationTool::MsAlign,
            proteoforms(0.03, 3.0),
        ),
    ];
    let database = Processor::new(top_down_options())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();

    assert_eq!(database.len(), 8);
    assert_eq!(all_ids(&database), (1..=16).collect_vec());
    for target in &database {
        assert_eq!(target.evidence.len(), 2);
        assert!(
            target.statistics.net_stdev < 1e-6,
            "{}: {:?}",
            target.clean_sequence,
            target.evidence.iter().map(|e| e.observed_net).collect_vec()
        );
        for evidence in &target.evidence {
            assert!(
                (evidence.monoisotopic_mass - target.theoretical_monoisotopic_mass).abs() < 1e-5
            );
        }
    }
    let shifted = data_sets[1].alignment.as_ref().unwrap().warp().unwrap();
    assert!((shifted.mass_calibration.transform(1500.0) - 3.0).abs() < 1e-3);
}

/// Without known masses nothing can be matched, the dataset is left as is
#[test]
fn top_down_without_masses() {
    let evidence = (0..8)
        .map(|i| {
            msalign(
                &format!("MKLV{}", "G".repeat(i + 1)),
                100 + 50 * i,
                i as f64 / 7.0,
                0.0,
                8,
            )
        })
        .collect_vec();
    let mut data_sets = vec![LcmsDataSet::new(
        "QC_01_MSAlign_syn.txt",
        LcmsIdentificationTool::MsAlign,
        evidence.clone(),
    )];
    let database = Processor::new(top_down_options())
        .unwrap()
        .process(&mut data_sets, &mut ())
        .unwrap();

    assert_eq!(database.len(), 8);
    let alignment = data_sets[0].alignment.as_ref().unwrap();
    assert!(alignment.is_degenerate());
    assert_eq!(alignment.warp().unwrap().matches, 0);
    for corrected in &data_sets[0].evidence {
        let before = evidence
            .iter()
            .find(|e| e.clean_peptide == corrected.clean_peptide)
            .unwrap();
        assert_eq!(corrected.observed_net, before.observed_net);
        assert_eq!(corrected.monoisotopic_mass, 0.0);
    }
}
