#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kbforge_core::{Fact, FactWriter, HAS_TRANSLATION, LABEL, Theme, ThemeGroup, ThemeRegistry};
use kbforge_extractors::{
    CaseFailure, CaseStatus, ExtractionContext, Extractor, ExtractorRegistry, TestHarness,
};
use uuid::Uuid;

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kbforge_{label}_{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_theme(folder: &Path, name: &str, facts: &[Fact]) {
    std::fs::create_dir_all(folder).unwrap();
    let mut writer = FactWriter::create(&folder.join(format!("{name}.tsv")), "fixture").unwrap();
    for fact in facts {
        writer.write(fact).unwrap();
    }
    writer.finish().unwrap();
}

fn case(cases: &Path, name: &str) -> (PathBuf, PathBuf) {
    let input = cases.join(name).join("in");
    let gold = cases.join(name).join("out");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&gold).unwrap();
    (input, gold)
}

/// Produces one fact more than its gold standard expects.
struct EmitsExtra {
    sample: Arc<Theme>,
}

impl Extractor for EmitsExtra {
    fn name(&self) -> &str {
        "EmitsExtra"
    }

    fn output(&self) -> Vec<Arc<Theme>> {
        vec![Arc::clone(&self.sample)]
    }

    fn extract(&self, _context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        self.sample.write(&Fact::new("a", "r", "b"))?;
        self.sample.write(&Fact::new("c", "r", "d"))?;
        Ok(())
    }
}

fn registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::with_builtin();
    registry.register("EmitsExtra", |themes: &ThemeRegistry, _| {
        Ok(Box::new(EmitsExtra {
            sample: themes.get_or_create("_sample", "", ThemeGroup::Internal)?,
        }))
    });
    registry
}

fn pattern_facts(theme: &str) -> Vec<Fact> {
    vec![
        Fact::new(format!("\"{theme} pattern\""), "<_pattern>", "\"$1\"").with_id("#1"),
        Fact::new("\"second\"", "<_pattern>", "\"$2\""),
    ]
}

fn translated(word: &str, language: &str, translation: &str) -> Fact {
    Fact::new(
        format!("\"{word}\"@{language}"),
        HAS_TRANSLATION,
        format!("\"{translation}\"@eng"),
    )
}

#[test]
fn test_harness_reports_every_case() {
    let root = temp_dir("harness");
    let cases = root.join("testCases");

    let (input, gold) = case(&cases, "DictionaryExtractor");
    std::fs::write(input.join("datainput.txt"), "# word list\nde\tHaus\thouse\nfr\tmaison\thouse\n").unwrap();
    write_theme(
        &gold,
        "_dictionary",
        &[translated("maison", "fr", "house"), translated("Haus", "de", "house")],
    );

    let (_, gold) = case(&cases, "EmitsExtra");
    write_theme(&gold, "_sample", &[Fact::new("a", "r", "b")]);

    case(&cases, "NoSuchExtractor");

    let (input, gold) = case(&cases, "PatternHardExtractor");
    for theme in [
        "_infoboxPatterns",
        "_titlePatterns",
        "_categoryPatterns",
        "_disambiguationPatterns",
        "_extendedContextWikiPatterns",
        "_extendedStructureWikiPatterns",
        "_rules",
    ] {
        write_theme(&input, theme, &pattern_facts(theme));
        write_theme(&gold, theme, &pattern_facts(theme));
    }

    let (input, gold) = case(&cases, "TranslationExtractor");
    write_theme(&input, "_dictionary", &[translated("Haus", "de", "house")]);
    write_theme(
        &input,
        "_foreignLabels",
        &[
            Fact::new("<Building_1>", LABEL, "\"Haus\"@de"),
            Fact::new("<Building_2>", LABEL, "\"Schloss\"@de"),
        ],
    );
    write_theme(
        &gold,
        "yagoTranslatedLabels",
        &[Fact::new("<Building_1>", LABEL, "\"house\"@eng")],
    );

    let extractors = registry();
    let report = TestHarness::new(&extractors, &cases, root.join("output"))
        .with_header("Test of kbforge")
        .run_all()
        .unwrap();

    let names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "DictionaryExtractor",
            "EmitsExtra",
            "NoSuchExtractor",
            "PatternHardExtractor",
            "TranslationExtractor"
        ]
    );
    assert_eq!(report.summary(), "3/5 tests succeeded");
    assert_eq!(report.failed(), 2);

    assert!(report.case("DictionaryExtractor").unwrap().passed());
    assert!(report.case("PatternHardExtractor").unwrap().passed());
    assert!(report.case("TranslationExtractor").unwrap().passed());

    match &report.case("EmitsExtra").unwrap().status {
        CaseStatus::Failed(CaseFailure::Mismatch(mismatches)) => {
            assert_eq!(mismatches.len(), 1);
            assert_eq!(mismatches[0].theme, "_sample");
            assert!(mismatches[0].diff.missing.is_empty());
            assert_eq!(mismatches[0].diff.extra, vec![Fact::new("c", "r", "d")]);
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(matches!(
        report.case("NoSuchExtractor").unwrap().status,
        CaseStatus::Failed(CaseFailure::UnknownExtractor)
    ));

    // Each case writes into its own folder.
    assert!(root.join("output").join("EmitsExtra").join("_sample.tsv").exists());
    assert!(root.join("output").join("DictionaryExtractor").join("_dictionary.tsv").exists());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_execution_failure_and_missing_gold() {
    let root = temp_dir("harness_failures");
    let cases = root.join("testCases");

    // No datainput.txt and no dictionary.txt: the extractor cannot run.
    case(&cases, "DictionaryExtractor");

    let (_, _gold) = case(&cases, "EmitsExtra");

    let extractors = registry();
    let harness = TestHarness::new(&extractors, &cases, root.join("output"));
    let report = harness.run_all().unwrap();
    assert_eq!(report.summary(), "0/2 tests succeeded");

    assert!(matches!(
        &report.case("DictionaryExtractor").unwrap().status,
        CaseStatus::Failed(CaseFailure::Execution(message)) if message.contains("word list")
    ));
    assert!(matches!(
        &report.case("EmitsExtra").unwrap().status,
        CaseStatus::Failed(CaseFailure::MissingGold { theme }) if theme == "_sample"
    ));
    assert!(!root.join("output").join("DictionaryExtractor").join("_dictionary.tsv").exists());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_case_without_gold_folder() {
    let root = temp_dir("harness_layout");
    let cases = root.join("testCases");
    std::fs::create_dir_all(cases.join("EmitsExtra").join("in")).unwrap();

    let extractors = registry();
    let report = TestHarness::new(&extractors, &cases, root.join("output")).run_all().unwrap();
    assert!(matches!(
        &report.case("EmitsExtra").unwrap().status,
        CaseStatus::Failed(CaseFailure::MissingFolder(path)) if path.ends_with("out")
    ));

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_missing_cases_folder_is_an_error() {
    let root = temp_dir("harness_missing");
    let extractors = registry();
    let harness = TestHarness::new(&extractors, root.join("nowhere"), root.join("output"));
    assert!(harness.run_all().is_err());
    std::fs::remove_dir_all(&root).ok();
}
