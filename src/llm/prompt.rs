//! Prompt construction and response parsing shared by all backends.

use std::fmt::Write;

use crate::config::{Beacon, ProjectRule};

use super::{Enrichment, ProviderError};

/// Render the enrichment instructions for one task description.
///
/// The full beacon/direction catalog and the project keyword hints are sent
/// on every call; the service keeps no session state.
pub fn build_prompt(description: &str, beacons: &[Beacon], projects: &[ProjectRule]) -> String {
    let mut out = String::new();

    out.push_str(
        "You are a task enrichment assistant. Analyze the given task and suggest \
         appropriate tags and metadata based on the user's personal goal system \
         called \"Beacons\".\n\n\
         ## Beacons System\n\
         The user organizes tasks around high-level life goals (Beacons) and specific \
         paths to achieve them (Directions).\n\
         Tasks that align with MULTIPLE beacons should be prioritized higher.\n\
         Tasks that don't align with ANY beacon should be marked as \"waste\".\n\n\
         ### Available Beacons and their Directions:\n",
    );

    for beacon in beacons {
        let _ = writeln!(
            out,
            "\n**{}** (`{}`): {}",
            beacon.name, beacon.tag, beacon.description
        );
        out.push_str("Directions:\n");
        for dir in &beacon.directions {
            let _ = writeln!(out, "  - {} (`{}`): {}", dir.name, dir.tag, dir.description);
        }
    }

    if !projects.is_empty() {
        out.push_str("\n### Available Projects:\n");
        for proj in projects {
            let _ = writeln!(out, "- {} (keywords: {})", proj.name, proj.keywords.join(", "));
        }
    }

    let _ = write!(
        out,
        "\n## Task Assessment Dimensions\n\n\
         ### Effort (mental/cognitive difficulty)\n\
         - E (Easy): Quick, straightforward, low cognitive load\n\
         - N (Normal): Standard complexity, moderate thinking required\n\
         - D (Difficult): Complex, requires deep focus, mentally taxing\n\n\
         ### Impact (value delivered)\n\
         - H (High): Benefits many people, unlocks future progress\n\
         - M (Medium): Moderate value, helps some people or processes\n\
         - L (Low): Limited impact, nice-to-have\n\n\
         ### Time Estimate (use pessimistic estimation)\n\
         Values: 15m, 30m, 1h, 2h, 4h, 8h, 2d\n\
         Ask: \"Would X time be enough?\" - when the answer is \"maybe\", double it.\n\n\
         ### Fun (enjoyment level)\n\
         - H (High): Enjoyable, engaging task\n\
         - M (Medium): Neutral\n\
         - L (Low): Boring, tedious\n\n\
         ## Task to Analyze\n\
         \"{description}\"\n\n\
         ## Instructions\n\
         1. Identify which Beacons this task contributes to (can be multiple)\n\
         2. Identify specific Directions within those Beacons\n\
         3. Suggest a project if keywords match\n\
         4. Suggest priority (H/M/L) based on external pressure or deadlines\n\
         5. Assess effort, impact, time estimate, and fun level\n\
         6. Suggest due/scheduled dates only for clear time references in the task\n\
         7. Optionally improve the description to be more actionable\n\
         8. If the task doesn't align with any beacon, mark it as waste\n\n\
         Respond with ONLY a JSON object in this exact format:\n\
         {{\n\
           \"description\": \"improved task description or the original\",\n\
           \"beacons\": [\"b.beacon1\"],\n\
           \"directions\": [\"d.direction1\"],\n\
           \"project\": \"project-name or empty string\",\n\
           \"priority\": \"H/M/L or empty string\",\n\
           \"due\": \"taskwarrior date (e.g. 'tomorrow', '2026-09-01', 'eow') or empty string\",\n\
           \"scheduled\": \"taskwarrior date or empty string\",\n\
           \"effort\": \"E/N/D\",\n\
           \"impact\": \"H/M/L\",\n\
           \"estimate\": \"15m/30m/1h/2h/4h/8h/2d\",\n\
           \"fun\": \"H/M/L\",\n\
           \"blocks\": 0,\n\
           \"is_waste\": false,\n\
           \"reasoning\": \"brief explanation of the assessment\"\n\
         }}\n"
    );

    out
}

/// Extract and parse the suggestion object from raw model output.
///
/// Models routinely wrap the JSON in commentary, so the first `{` to the last
/// `}` span is taken; anything outside it is ignored.
pub fn parse_enrichment_response(response: &str) -> Result<Enrichment, ProviderError> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');
    let span = match (start, end) {
        (Some(s), Some(e)) if e > s => &response[s..=e],
        _ => return Err(ProviderError::NoJson),
    };
    let enrichment: Enrichment = serde_json::from_str(span)?;
    Ok(enrichment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_beacons;

    #[test]
    fn parses_bare_json() {
        let e = parse_enrichment_response(
            r#"{"description":"Fix login bug","beacons":["b.great.dev"],"is_waste":false}"#,
        )
        .unwrap();
        assert_eq!(e.description, "Fix login bug");
        assert_eq!(e.beacons, vec!["b.great.dev"]);
    }

    #[test]
    fn tolerates_surrounding_commentary() {
        let raw = "Sure! Here is the assessment you asked for:\n\
                   {\"beacons\": [\"b.organized\"], \"priority\": \"M\"}\n\
                   Let me know if you need anything else.";
        let e = parse_enrichment_response(raw).unwrap();
        assert_eq!(e.beacons, vec!["b.organized"]);
        assert_eq!(e.priority, "M");
    }

    #[test]
    fn missing_json_is_an_error() {
        assert!(matches!(
            parse_enrichment_response("I could not analyze this task."),
            Err(ProviderError::NoJson)
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_enrichment_response("{\"beacons\": [unquoted]}"),
            Err(ProviderError::BadJson(_))
        ));
    }

    #[test]
    fn prompt_includes_catalog_and_projects() {
        let beacons = default_beacons();
        let projects = vec![ProjectRule {
            name: "work".into(),
            keywords: vec!["JIRA-".into(), "company".into()],
            quota: 0,
        }];
        let prompt = build_prompt("Review PR", &beacons, &projects);
        assert!(prompt.contains("b.great.dev"));
        assert!(prompt.contains("d.sw.design"));
        assert!(prompt.contains("work (keywords: JIRA-, company)"));
        assert!(prompt.contains("\"Review PR\""));
    }
}
