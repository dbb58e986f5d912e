//! End-to-end conversation tests for the chat core.
//!
//! Each test drives a fresh [`ChatOrchestrator`] with the default rule oracle
//! and spellchecker over the fixture roster, asking questions the way a user
//! would and checking both the answers and what the session remembers.

use std::sync::Arc;
use std::thread;

use carebot_chat::{
    Answer, AnswerEnvelope, BranchCatalog, ChatError, ChatOrchestrator, PractitionerCache,
};
use carebot_core::config::ChatConfig;
use carebot_core::types::{parse_roster, PractitionerRecord};

// =============================================================================
// Helpers
// =============================================================================

const ROSTER_JSON: &str = include_str!("fixtures/roster.json");

fn fixture_roster() -> Vec<PractitionerRecord> {
    parse_roster(ROSTER_JSON).unwrap()
}

fn make_orchestrator() -> ChatOrchestrator {
    ChatOrchestrator::new(
        ChatConfig::default(),
        Arc::new(BranchCatalog::default()),
        Arc::new(PractitionerCache::with_records(fixture_roster())),
    )
}

fn ask(orch: &ChatOrchestrator, session: &str, question: &str) -> Answer {
    orch.handle_question(session, question).unwrap()
}

fn lines(answer: &Answer) -> Vec<String> {
    answer.as_lines().expect("expected a list answer").to_vec()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Fixture
// =============================================================================

#[test]
fn test_fixture_skips_nameless_entries() {
    let roster = fixture_roster();
    assert_eq!(roster.len(), 4);
    assert!(roster.iter().all(|r| !r.name.is_empty()));
}

// =============================================================================
// Knowledge base
// =============================================================================

#[test]
fn test_list_branches_matches_catalog() {
    let orch = make_orchestrator();
    let expected = orch.catalog().branch_names();

    assert_eq!(lines(&ask(&orch, "s1", "which branches do you have")), expected);

    // Unaffected by remembered state.
    ask(&orch, "s1", "where is Bulbula Branch");
    assert_eq!(lines(&ask(&orch, "s1", "which branches do you have")), expected);
}

#[test]
fn test_services_lists_branch_departments() {
    let orch = make_orchestrator();
    let expected = orch
        .catalog()
        .by_slug("bulbula")
        .map(|b| b.departments.clone())
        .unwrap();
    assert_eq!(lines(&ask(&orch, "s1", "services in bulbula")), expected);
}

#[test]
fn test_emergency_contacts() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "emergency number"),
        Answer::text("Call: 6511, +251-939515151, +251-939525252")
    );
}

// =============================================================================
// Branch follow-ups
// =============================================================================

#[test]
fn test_where_is_it_uses_remembered_branch() {
    let orch = make_orchestrator();
    let first = ask(&orch, "s1", "where is Rwanda Branch");
    assert_eq!(
        first,
        Answer::text("Our Rwanda Branch is located in front of Rwanda Embassy.")
    );
    assert_eq!(
        orch.session_snapshot("s1").and_then(|c| c.branch).as_deref(),
        Some("Rwanda Branch")
    );

    assert_eq!(ask(&orch, "s1", "where is it"), first);
}

#[test]
fn test_misspelled_branch_is_corrected() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "where is rwanda brnach"),
        Answer::text("Our Rwanda Branch is located in front of Rwanda Embassy.")
    );
}

#[test]
fn test_where_is_it_without_memory_asks_for_branch() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "where is it"),
        Answer::text("Please specify a branch name.")
    );
}

// =============================================================================
// Days
// =============================================================================

#[test]
fn test_doctors_on_day() {
    let orch = make_orchestrator();
    assert_eq!(
        lines(&ask(&orch, "s1", "doctors working on monday")),
        strings(&[
            "Dr. Abebe Kebede (Consultant) (Cardiology)",
            "Dr. Meron Alemu (Internal Medicine)",
        ])
    );
    assert_eq!(
        orch.session_snapshot("s1").and_then(|c| c.day).as_deref(),
        Some("monday")
    );
}

#[test]
fn test_day_without_doctors() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "doctors working on sunday"),
        Answer::text("No doctors available on Sunday.")
    );
}

#[test]
fn test_invalid_day_prompts_and_is_not_remembered() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "doctor working on funday"),
        Answer::text("Please specify a valid day.")
    );
    assert_eq!(orch.session_snapshot("s1").and_then(|c| c.day), None);
}

// =============================================================================
// Practitioners
// =============================================================================

#[test]
fn test_single_specialty_match_then_availability() {
    let orch = make_orchestrator();
    assert_eq!(
        lines(&ask(&orch, "s1", "show doctors for cardiology")),
        strings(&["Dr. Abebe Kebede (Consultant) (Cardiology)"])
    );

    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor.as_deref(), Some("Dr. Abebe Kebede"));
    assert_eq!(ctx.doctors, None);
    assert_eq!(ctx.specialty.as_deref(), Some("cardiology"));

    assert_eq!(
        lines(&ask(&orch, "s1", "availability of doctor")),
        strings(&[
            "Dr. Abebe Kebede (Consultant) is available on:",
            "Monday: 08:00 - 12:00",
            "Wednesday: 14:00 - 17:00",
            "",
        ])
    );
}

#[test]
fn test_group_specialty_match_then_availability() {
    let orch = make_orchestrator();
    assert_eq!(
        lines(&ask(&orch, "s1", "show doctors for pediatrics")),
        strings(&[
            "Dr. Hana Tesfaye (Pediatrics)",
            "Dr. Samuel Girma (Senior) (Pediatrics)",
        ])
    );
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor, None);
    assert_eq!(
        ctx.doctors,
        Some(strings(&["Dr. Hana Tesfaye", "Dr. Samuel Girma"]))
    );

    assert_eq!(
        lines(&ask(&orch, "s1", "availability of them")),
        strings(&[
            "Dr. Hana Tesfaye is available on:",
            "Tuesday: 09:00 - 13:00",
            "",
            "Dr. Samuel Girma (Senior) is available on:",
            "Saturday: 08:30 - 12:30",
            "",
        ])
    );

    // The group is still the referent afterwards.
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor, None);
    assert_eq!(ctx.doctors.map(|d| d.len()), Some(2));
}

#[test]
fn test_doctor_and_group_are_exclusive() {
    let orch = make_orchestrator();
    for question in [
        "show doctors for cardiology",
        "when is Dr. Meron Alemu available",
        "show doctors for pediatrics",
    ] {
        ask(&orch, "s1", question);
        let ctx = orch.session_snapshot("s1").unwrap();
        assert!(
            !(ctx.doctor.is_some() && ctx.doctors.is_some()),
            "both set after {:?}: {:?}",
            question,
            ctx
        );
    }
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor, None);
    assert_eq!(ctx.doctors.map(|d| d.len()), Some(2));
}

#[test]
fn test_remembered_doctor_missing_after_refresh() {
    let orch = make_orchestrator();
    ask(&orch, "s1", "show doctors for cardiology");

    let without_abebe: Vec<PractitionerRecord> = fixture_roster()
        .into_iter()
        .filter(|r| !r.name.starts_with("Dr. Abebe"))
        .collect();
    orch.refresh_roster(without_abebe);

    assert_eq!(
        lines(&ask(&orch, "s1", "availability of doctor")),
        strings(&["Doctor \"Dr. Abebe Kebede\" not found."])
    );
}

#[test]
fn test_availability_without_doctor_asks_for_name() {
    let orch = make_orchestrator();
    assert_eq!(
        ask(&orch, "s1", "availability of doctor"),
        Answer::text("Please provide a doctor's name.")
    );
}

#[test]
fn test_list_doctors_follows_roster() {
    let orch = make_orchestrator();
    assert_eq!(lines(&ask(&orch, "s1", "list doctors")).len(), 4);
    orch.refresh_roster(vec![PractitionerRecord::new("Dr. Lulit Bekele", "ENT", None)]);
    assert_eq!(
        lines(&ask(&orch, "s1", "list doctors")),
        strings(&["Dr. Lulit Bekele"])
    );
}

#[test]
fn test_list_doctors_while_group_remembered() {
    let orch = make_orchestrator();
    ask(&orch, "s1", "show doctors for pediatrics");

    assert_eq!(
        lines(&ask(&orch, "s1", "list doctors")),
        strings(&[
            "Dr. Abebe Kebede (Consultant)",
            "Dr. Hana Tesfaye",
            "Dr. Samuel Girma (Senior)",
            "Dr. Meron Alemu",
        ])
    );
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor, None);
    assert_eq!(ctx.doctors.map(|d| d.len()), Some(2));

    // Another specialty still replaces the group.
    assert_eq!(
        lines(&ask(&orch, "s1", "show doctors for cardiology")),
        strings(&["Dr. Abebe Kebede (Consultant) (Cardiology)"])
    );
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor.as_deref(), Some("Dr. Abebe Kebede"));
    assert_eq!(ctx.doctors, None);
}

#[test]
fn test_named_doctor_outside_remembered_group() {
    let orch = make_orchestrator();
    ask(&orch, "s1", "show doctors for pediatrics");
    assert_eq!(
        lines(&ask(&orch, "s1", "when is Dr. Meron Alemu available")),
        strings(&[
            "Dr. Meron Alemu is available on:",
            "Monday: 10:00 - 16:00",
            "Friday: 09:00 - 11:00",
            "",
        ])
    );
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.doctor.as_deref(), Some("Dr. Meron Alemu"));
    assert_eq!(ctx.doctors, None);
}

#[test]
fn test_visit_day_question_while_day_remembered() {
    let orch = make_orchestrator();
    ask(&orch, "s1", "doctors working on monday");

    assert_eq!(
        lines(&ask(&orch, "s1", "what day can I visit Dr. Meron Alemu")),
        strings(&[
            "Dr. Meron Alemu is available on:",
            "Monday: 10:00 - 16:00",
            "Friday: 09:00 - 11:00",
            "",
        ])
    );
    let ctx = orch.session_snapshot("s1").unwrap();
    assert_eq!(ctx.day.as_deref(), Some("monday"));
    assert_eq!(ctx.doctor.as_deref(), Some("Dr. Meron Alemu"));
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn test_reset_starts_fresh() {
    let orch = make_orchestrator();
    ask(&orch, "s1", "where is Rwanda Branch");
    assert!(orch.reset("s1").unwrap().success);
    assert!(orch.session_snapshot("s1").is_none());

    assert_eq!(
        ask(&orch, "s1", "where is it"),
        Answer::text("Please specify a branch name.")
    );
    assert!(orch.session_snapshot("s1").unwrap().is_empty());
}

#[test]
fn test_sessions_do_not_share_memory() {
    let orch = Arc::new(make_orchestrator());

    let handles: Vec<_> = [("a", "Rwanda Branch"), ("b", "Bulbula Branch")]
        .into_iter()
        .map(|(session, branch)| {
            let orch = Arc::clone(&orch);
            thread::spawn(move || {
                for _ in 0..20 {
                    orch.handle_question(session, &format!("where is {}", branch))
                        .unwrap();
                    let answer = orch.handle_question(session, "where is it").unwrap();
                    assert!(
                        answer.as_text().is_some_and(|t| t.contains(branch)),
                        "session {} answered {:?}",
                        session,
                        answer
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let sessions = orch.list_sessions();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.message_count == 40));
}

#[test]
fn test_rejected_questions_leave_no_session() {
    let orch = make_orchestrator();
    assert!(matches!(
        orch.handle_question("s1", "  "),
        Err(ChatError::EmptyQuestion)
    ));
    assert!(orch.list_sessions().is_empty());
}

// =============================================================================
// Wire shape
// =============================================================================

#[test]
fn test_answer_envelope_json() {
    let orch = make_orchestrator();

    let text = AnswerEnvelope::from(ask(&orch, "s1", "emergency number"));
    assert_eq!(
        serde_json::to_value(&text).unwrap(),
        serde_json::json!({ "answer": "Call: 6511, +251-939515151, +251-939525252" })
    );

    let list = AnswerEnvelope::from(ask(&orch, "s1", "which branches do you have"));
    assert_eq!(
        serde_json::to_value(&list).unwrap(),
        serde_json::json!({ "answer": ["Rwanda Branch", "Bulbula Branch"] })
    );
}
