//! Prompt Builder — renders normalized input into the single text prompt sent
//! to the generator. Output is deterministic: equal inputs give identical prompts.

use crate::generator::prompts::{ADVISOR_ROLE, COUNSELOR_ROLE, JSON_ONLY_INSTRUCTION};
use crate::recommendation::preferences::PreferenceRecord;
use crate::recommendation::reference::{CompleteCollege, ReferenceDataset};

/// Exact response shape for preference mode. Keys must match `schema::REQUIRED_KEYS`.
pub const PREFERENCE_RESPONSE_SCHEMA: &str = r#"Provide your recommendations as a JSON object with EXACTLY these keys, each holding an array of strings:
{
  "streams": ["Stream 1", "Stream 2", "Stream 3"],
  "colleges": ["College Type 1", "College Type 2"],
  "careers": ["Career Path 1", "Career Path 2", "Career Path 3"],
  "institutions": ["Institution 1", "Institution 2", "Institution 3"]
}"#;

/// Exact response shape for profile mode. Keys must match `schema::PICK_KEYS`.
pub const PROFILE_RESPONSE_SCHEMA: &str = r#"Provide your answer as a JSON array of objects with EXACTLY these keys:
[
  {"college": "Institution name from the list", "location": "Its location", "reason": "Short reason"}
]"#;

/// Number of colleges the profile prompt asks for.
const PROFILE_PICKS: usize = 3;

/// Builds the preference-mode prompt: every field restated under a readable label.
pub fn build_preference_prompt(record: &PreferenceRecord) -> String {
    let fields = [
        (
            "College Preference",
            format!("{} Colleges", record.college_preference.label()),
        ),
        ("Mathematics", record.math.to_string()),
        ("Science", record.science.to_string()),
        ("Literature", record.literature.to_string()),
        ("Social Sciences", record.social.to_string()),
        ("Arts/Creative", record.art.to_string()),
        ("Technology", record.tech.to_string()),
        ("Business", record.business.to_string()),
        ("Hands-on Work", record.hands_on.to_string()),
        ("Career Focus", record.career_focus.clone()),
        ("Location Preference", record.location.clone()),
        ("College Type", record.college_type.label().to_string()),
    ]
    .iter()
    .map(|(label, value)| format!("- {label}: {value}"))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "{ADVISOR_ROLE}\n\n\
        Based on the following student preferences, recommend suitable college streams, \
        college types, career paths and institutions.\n\n\
        Preferences:\n{fields}\n\n\
        {PREFERENCE_RESPONSE_SCHEMA}\n\n\
        {JSON_ONLY_INSTRUCTION}"
    )
}

/// Builds the profile-mode prompt from a free-text profile and the reference
/// dataset. Incomplete rows are dropped first, then at most `limit` rows are kept.
pub fn build_profile_prompt(profile: &str, dataset: &ReferenceDataset, limit: usize) -> String {
    let colleges = dataset
        .complete_records()
        .take(limit)
        .map(|college| format_college(&college))
        .collect::<Vec<_>>();

    let colleges = if colleges.is_empty() {
        "(no reference colleges available)".to_string()
    } else {
        colleges.join("\n")
    };

    format!(
        "{COUNSELOR_ROLE}\n\n\
        Here is the student profile:\n{profile}\n\n\
        Below is a list of colleges with relevant metrics:\n{colleges}\n\n\
        Based on this, recommend {PROFILE_PICKS} colleges from the list that best match \
        the student's interests and academic potential, with a brief reason for each.\n\n\
        {PROFILE_RESPONSE_SCHEMA}\n\n\
        {JSON_ONLY_INSTRUCTION}",
        profile = profile.trim(),
    )
}

fn format_college(college: &CompleteCollege<'_>) -> String {
    format!(
        "institution: {}, location: {}, ar score: {}, fsr score: {}, overall score: {}",
        college.institution,
        college.location,
        college.ar_score,
        college.fsr_score,
        college.overall_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::preferences::{normalize_preferences, CollegeType};
    use crate::recommendation::reference::CollegeRecord;
    use crate::recommendation::schema::{PICK_KEYS, REQUIRED_KEYS};
    use serde_json::json;

    fn sample_record() -> PreferenceRecord {
        normalize_preferences(&json!({
            "math": 5,
            "science": 5,
            "literature": 1,
            "careerFocus": "Engineering",
            "location": "Urban",
            "collegeType": "Technical"
        }))
        .unwrap()
    }

    fn college(name: &str) -> CollegeRecord {
        CollegeRecord {
            institution: Some(name.to_string()),
            location: Some("Somewhere".to_string()),
            ar_score: Some(50.0),
            fsr_score: Some(60.5),
            overall_score: Some(55.0),
        }
    }

    #[test]
    fn test_preference_prompt_restates_every_field_with_label() {
        let prompt = build_preference_prompt(&sample_record());
        for line in [
            "- College Preference: Indian Colleges",
            "- Mathematics: 5/5",
            "- Science: 5/5",
            "- Literature: 1/5",
            "- Social Sciences: 3/5",
            "- Arts/Creative: 3/5",
            "- Technology: 3/5",
            "- Business: 3/5",
            "- Hands-on Work: 3/5",
            "- Career Focus: Engineering",
            "- Location Preference: Urban",
            "- College Type: Technical",
        ] {
            assert!(prompt.contains(line), "missing line: {line}");
        }
    }

    #[test]
    fn test_preference_prompt_carries_role_schema_and_json_instruction() {
        let prompt = build_preference_prompt(&PreferenceRecord::default());
        assert!(prompt.starts_with(ADVISOR_ROLE));
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
        for key in REQUIRED_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "schema lacks {key}");
        }
    }

    #[test]
    fn test_preference_prompt_is_deterministic() {
        let record = sample_record();
        assert_eq!(
            build_preference_prompt(&record),
            build_preference_prompt(&record.clone())
        );
    }

    #[test]
    fn test_liberal_arts_uses_readable_label() {
        let record = PreferenceRecord {
            college_type: CollegeType::LiberalArts,
            ..PreferenceRecord::default()
        };
        assert!(build_preference_prompt(&record).contains("- College Type: Liberal Arts"));
    }

    #[test]
    fn test_profile_prompt_embeds_profile_and_colleges() {
        let dataset = ReferenceDataset::new(vec![college("IIT Madras"), college("NIT Trichy")]);
        let prompt = build_profile_prompt("  Loves robotics and maths  ", &dataset, 20);

        assert!(prompt.starts_with(COUNSELOR_ROLE));
        assert!(prompt.contains("Here is the student profile:\nLoves robotics and maths\n"));
        assert!(prompt.contains(
            "institution: IIT Madras, location: Somewhere, ar score: 50, fsr score: 60.5, overall score: 55"
        ));
        assert!(prompt.contains("institution: NIT Trichy"));
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
        for key in PICK_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "schema lacks {key}");
        }
    }

    #[test]
    fn test_profile_prompt_drops_incomplete_rows_before_capping() {
        let mut records = vec![CollegeRecord {
            location: None,
            ..college("Broken Row")
        }];
        records.extend((0..30).map(|i| college(&format!("College {i:02}"))));
        let dataset = ReferenceDataset::new(records);

        let prompt = build_profile_prompt("profile", &dataset, 20);

        assert!(!prompt.contains("Broken Row"));
        assert_eq!(prompt.matches("institution: ").count(), 20);
        assert!(prompt.contains("College 00"));
        assert!(prompt.contains("College 19"));
        assert!(!prompt.contains("College 20"));
    }

    #[test]
    fn test_profile_prompt_with_empty_dataset_says_so() {
        let prompt = build_profile_prompt("profile", &ReferenceDataset::default(), 20);
        assert!(prompt.contains("(no reference colleges available)"));
    }
}
