//! End-to-end processing scenarios.

use std::io::Write;
use std::sync::Arc;

use jobscan_core::models::config::CustomRuleConfig;
use jobscan_core::models::entity::DurationValue;
use jobscan_core::{
    Category, JobProcessor, JobscanConfig, JobscanError, NormalizedValue, ProcessedJobInfo, Source, ValidationError,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const POSTING: &str =
    "5+ years experience with Python, TensorFlow, and AWS. Remote work available. Contact: careers@company.com";

fn processor() -> JobProcessor {
    JobProcessor::new(JobscanConfig::default()).unwrap()
}

fn has_keyword(result: &ProcessedJobInfo, keyword: &str) -> bool {
    [Category::Skills, Category::Technologies]
        .iter()
        .any(|c| result.normalized(*c).contains(&keyword))
}

fn duration(result: &ProcessedJobInfo, index: usize) -> &DurationValue {
    match &result.durations[index].value {
        NormalizedValue::Duration(d) => d,
        other => panic!("expected duration, got {:?}", other),
    }
}

#[test]
fn test_reference_posting() {
    let result = processor().process(POSTING).unwrap();

    let experience = duration(&result, 0);
    assert_eq!(experience.min, 5);
    assert!(experience.open_ended);

    assert_eq!(result.normalized(Category::Emails), vec!["careers@company.com"]);
    assert!(has_keyword(&result, "python"));
    assert!(has_keyword(&result, "tensorflow"));
    assert!(has_keyword(&result, "aws"));
    assert!(result.normalized(Category::WorkArrangements).contains(&"remote"));

    assert!(result.confidence(Category::Emails) > 0.0);
    assert_eq!(result.matched_skills[0].score, 1.0);
}

#[test]
fn test_empty_input_is_rejected() {
    match processor().process("") {
        Err(JobscanError::Validation(ValidationError::Empty)) => {}
        other => panic!("expected validation error, got {:?}", other.map(|r| r.cleaned_text)),
    }
}

#[test]
fn test_short_input_is_rejected() {
    assert!(matches!(
        processor().process("Go dev"),
        Err(JobscanError::Validation(ValidationError::TooShort { .. }))
    ));
}

#[test]
fn test_nothing_recognizable() {
    let result = processor()
        .process("Lorem ipsum dolor sit amet, consectetur adipiscing elit")
        .unwrap();

    for category in Category::ALL {
        assert!(result.values(category).is_empty(), "{} not empty", category);
        assert_eq!(result.confidence(category), 0.0);
    }
    assert_eq!(result.confidence_scores["overall"], 0.0);
}

#[test]
fn test_spans_stay_inside_cleaned_text() {
    let result = processor()
        .process("<h2>Senior Backend Developer</h2><p>Start: 15/01/2025. Pay 10-15 triệu VND.</p><ul><li>3 to 5 years of experience with Node.js</li><li>Call +84 912 345 678 or visit https://jobs.example.com/apply.</li></ul>")
        .unwrap();

    let len = result.cleaned_text.len();
    for category in Category::ALL {
        for value in result.values(category) {
            assert!(value.start < value.end);
            assert!(value.end <= len);
            assert!(result.cleaned_text.is_char_boundary(value.start));
        }
    }
    assert_eq!(result.normalized(Category::Urls), vec!["https://jobs.example.com/apply"]);
    assert_eq!(result.normalized(Category::Dates), vec!["2025-01-15"]);
}

#[test]
fn test_overlapping_rule_matches_keep_the_longer() {
    let result = processor()
        .process("We ask for 3 to 5 years of experience in backend work")
        .unwrap();

    assert_eq!(result.durations.len(), 1);
    let experience = duration(&result, 0);
    assert_eq!((experience.min, experience.max), (3, Some(5)));
    assert_eq!(result.durations[0].text, "3 to 5 years of experience");
}

#[test]
fn test_processing_is_idempotent() {
    let processor = processor();
    let mut first = processor.process(POSTING).unwrap();
    let second = processor.process(POSTING).unwrap();

    first.timestamp = second.timestamp;
    first.processing_time = second.processing_time;
    assert_eq!(first, second);
}

#[test]
fn test_degraded_mode_without_recognizer() {
    let mut config = JobscanConfig::default();
    config.ner.model_name = "disabled".to_string();
    let result = JobProcessor::new(config).unwrap().process(POSTING).unwrap();

    assert!(!result.metadata.ner_available);
    assert!(has_keyword(&result, "python"));
    for category in [Category::Responsibilities, Category::Qualifications, Category::Benefits] {
        assert_eq!(result.confidence(category), 0.0);
    }
    assert!(result
        .skills
        .iter()
        .all(|v| v.sources == vec![Source::Dictionary]));
}

#[test]
fn test_custom_dictionary_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"version": "test-1", "categories": {{"programming": [{{"term": "Elixir", "synonyms": ["ex"]}}]}}}}"#
    )
    .unwrap();

    let mut config = JobscanConfig::default();
    config.keywords.dictionary_path = Some(file.path().to_path_buf());
    let result = JobProcessor::new(config)
        .unwrap()
        .process("Elixir and Phoenix engineer")
        .unwrap();

    assert_eq!(result.metadata.dictionary_version, "test-1");
    assert_eq!(result.normalized(Category::Skills), vec!["elixir"]);
}

#[test]
fn test_reload_dictionary() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"version": "v2", "categories": {{"tool": [{{"term": "terraform"}}]}}}}"#
    )
    .unwrap();

    let mut processor = processor().without_recognizer();
    assert!(processor.process("python and terraform").unwrap().skills.len() == 1);

    processor.reload_dictionary(file.path()).unwrap();
    let result = processor.process("python and terraform").unwrap();
    assert!(result.skills.is_empty());
    assert_eq!(result.normalized(Category::Technologies), vec!["terraform"]);
}

#[test]
fn test_missing_dictionary_is_a_config_error() {
    let mut config = JobscanConfig::default();
    config.keywords.dictionary_path = Some("/nonexistent/dictionary.json".into());
    assert!(matches!(JobProcessor::new(config), Err(JobscanError::Config(_))));
}

#[test]
fn test_custom_rule() {
    let mut config = JobscanConfig::default();
    config.rules.custom.push(CustomRuleConfig {
        id: "url-github".to_string(),
        field: "url".to_string(),
        pattern: r"\bgithub\.com/[a-z0-9\-]+".to_string(),
        score: 0.6,
    });
    let result = JobProcessor::new(config)
        .unwrap()
        .process("Show us your work on github.com/jobscan before applying")
        .unwrap();

    assert_eq!(result.normalized(Category::Urls), vec!["github.com/jobscan"]);
    assert!(result.metadata.warnings.is_empty());
}

#[test]
fn test_shared_processor_across_threads() {
    let processor = Arc::new(processor());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let processor = Arc::clone(&processor);
            std::thread::spawn(move || processor.process(POSTING).unwrap().emails.len())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}

#[test]
fn test_common_words_are_not_keywords() {
    let result = processor()
        .process("We value trust and reach across every team we shift priorities to scale.")
        .unwrap();

    assert!(result.skills.is_empty(), "skills: {:?}", result.normalized(Category::Skills));
    assert!(result.technologies.is_empty(), "technologies: {:?}", result.normalized(Category::Technologies));
    assert!(result.matched_skills.is_empty());
    assert!(result.matched_technologies.is_empty());
}

#[test]
fn test_vietnamese_posting() {
    let result = processor()
        .process("Tuyển lập trình viên Python, yêu cầu 2 năm kinh nghiệm, kỹ năng làm việc nhóm, bảo hiểm đầy đủ.")
        .unwrap();

    assert_eq!(result.normalized(Category::Skills), vec!["python"]);
    assert_eq!(result.normalized(Category::SoftSkills), vec!["teamwork"]);
    assert!(result.normalized(Category::Roles).contains(&"software engineer"));
    assert!(result.normalized(Category::Benefits).contains(&"bảo hiểm"));

    let experience = duration(&result, 0);
    assert_eq!((experience.min, experience.max), (2, None));
    assert_eq!(result.durations[0].text, "2 năm kinh nghiệm");

    let vietnamese = result.normalized(Category::VietnameseKeywords);
    for keyword in ["lập trình viên", "kinh nghiệm", "làm việc nhóm", "bảo hiểm"] {
        assert!(vietnamese.contains(&keyword), "missing {}", keyword);
    }
    assert_eq!(result.matched_vietnamese_keywords.len(), 4);
    assert!(result.confidence(Category::VietnameseKeywords) > 0.0);
}

#[test]
fn test_entry_weight_lowers_confidence() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"categories": {{"programming": [{{"term": "python"}}], "tool": [{{"term": "jira", "weight": 0.5}}]}}}}"#
    )
    .unwrap();

    let mut config = JobscanConfig::default();
    config.keywords.dictionary_path = Some(file.path().to_path_buf());
    let result = JobProcessor::new(config)
        .unwrap()
        .without_recognizer()
        .process("python and jira tickets")
        .unwrap();

    assert_eq!(result.skills[0].score, 1.0);
    assert_eq!(result.technologies[0].score, 0.5);
    assert_eq!(result.matched_technologies[0].score, 1.0);
    assert!(result.confidence(Category::Technologies) < result.confidence(Category::Skills));
}
