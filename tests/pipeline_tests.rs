//! End-to-end behaviour of the message pipeline against in-memory collaborators.

mod common;

use std::fs;

use common::{Call, Mailbox, RecordingPrinter, msg, pipeline_config};
use rs_mail_printer::daemon::{build_pool, run_cycle};
use rs_mail_printer::domain::message::Intent;
use rs_mail_printer::error::ProcessError;
use rs_mail_printer::pipeline::extractor::{ExistingFilePolicy, SaveStatus};
use rs_mail_printer::pipeline::finalizer::FinalizePolicy;
use rs_mail_printer::pipeline::{MessageOutcome, Pipeline, SkipReason};

const UNREAD_PERSONAL: &[&str] = &["UNREAD", "CATEGORY_PERSONAL"];

// ─── Print request from a known sender ──────────────────────────────

#[test]
fn print_request_saves_prints_and_marks_read() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = b"%PDF-1.7\n\x00\x01\x02binary\xff".to_vec();
    let mut mailbox = Mailbox::default();
    mailbox.attach("A1", &pdf);
    mailbox.add(msg(
        "invoice-mail",
        UNREAD_PERSONAL,
        "Someone <authorized@example.com>",
        "please print",
        &[("doc.pdf", "A1")],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("invoice-mail");

    assert!(matches!(
        out,
        MessageOutcome::Processed { intent: Intent::Print, marked_read: true, .. }
    ));
    assert_eq!(fs::read(dir.path().join("doc.pdf")).unwrap(), pdf);
    assert_eq!(printer.jobs(), vec![dir.path().join("doc.pdf")]);
    assert_eq!(
        mailbox.calls(),
        vec![
            Call::Get("invoice-mail".into()),
            Call::Fetch("invoice-mail".into(), "A1".into()),
            Call::Modify("invoice-mail".into(), vec!["UNREAD".into()]),
        ]
    );
}

#[test]
fn nameless_body_part_does_not_block_the_print() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach("BODY", b"<html><p>see attached</p></html>");
    mailbox.attach("A1", b"%PDF-1.4");
    mailbox.add(msg(
        "html-mail",
        UNREAD_PERSONAL,
        "authorized@example.com",
        "print",
        &[("", "BODY"), ("doc.pdf", "A1")],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("html-mail");

    let MessageOutcome::Processed { report, marked_read: true, .. } = out else {
        panic!("expected processed outcome marked read");
    };
    assert_eq!(report.saved.len(), 1);
    assert_eq!(printer.jobs(), vec![dir.path().join("doc.pdf")]);
    assert_eq!(mailbox.fetches(), vec!["A1".to_string()]);
}

// ─── Mail that was already read ─────────────────────────────────────

#[test]
fn read_message_is_not_touched() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach("A1", b"x");
    mailbox.add(msg(
        "seen-mail",
        &["CATEGORY_PERSONAL"],
        "authorized@example.com",
        "print",
        &[("doc.pdf", "A1")],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("seen-mail");

    assert!(matches!(out, MessageOutcome::Skipped { reason: SkipReason::NotEligible, .. }));
    assert!(mailbox.fetches().is_empty());
    assert!(mailbox.modifications().is_empty());
    assert!(printer.jobs().is_empty());
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn non_personal_category_is_not_touched() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.add(msg(
        "promo",
        &["UNREAD", "CATEGORY_PROMOTIONS"],
        "authorized@example.com",
        "print",
        &[],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("promo");

    assert!(matches!(out, MessageOutcome::Skipped { reason: SkipReason::NotEligible, .. }));
    assert!(mailbox.modifications().is_empty());
}

// ─── Unknown sender without token ───────────────────────────────────

#[test]
fn unauthorized_sender_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach("A1", b"x");
    mailbox.add(msg(
        "stranger-mail",
        UNREAD_PERSONAL,
        "mallory@evil.example",
        "save please",
        &[("doc.pdf", "A1")],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("stranger-mail");

    assert!(matches!(out, MessageOutcome::Skipped { reason: SkipReason::Unauthorized, .. }));
    assert!(mailbox.fetches().is_empty());
    assert!(mailbox.modifications().is_empty());
}

#[test]
fn shared_token_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach("A1", b"x");
    mailbox.add(msg(
        "tok",
        UNREAD_PERSONAL,
        "friend@elsewhere.example",
        "Save [TOK-42]",
        &[("notes.txt", "A1")],
    ));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("tok");

    assert!(matches!(out, MessageOutcome::Processed { intent: Intent::Save, .. }));
    assert!(printer.jobs().is_empty());
    assert!(dir.path().join("notes.txt").exists());
}

// ─── Existing files ─────────────────────────────────────────────────

#[test]
fn rerun_with_skip_policy_keeps_existing_invoice() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("invoice.pdf"), b"printed yesterday").unwrap();

    let mut mailbox = Mailbox::default();
    mailbox.attach("INV", b"something else");
    mailbox.add(msg(
        "again",
        UNREAD_PERSONAL,
        "authorized@example.com",
        "print invoice",
        &[("invoice.pdf", "INV")],
    ));
    let printer = RecordingPrinter::default();
    let mut cfg = pipeline_config(dir.path());
    cfg.existing_files = ExistingFilePolicy::Skip;

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("again");

    let MessageOutcome::Processed { report, .. } = out else {
        panic!("expected processed outcome");
    };
    assert_eq!(report.saved[0].status, SaveStatus::AlreadyPresent);
    assert!(mailbox.fetches().is_empty());
    assert_eq!(fs::read(dir.path().join("invoice.pdf")).unwrap(), b"printed yesterday");
    // the file on disk is still what gets printed
    assert_eq!(printer.jobs(), vec![dir.path().join("invoice.pdf")]);
}

#[test]
fn same_filename_in_two_messages_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach("first", b"first");
    mailbox.attach("second", b"second");
    mailbox.add(msg("a", UNREAD_PERSONAL, "authorized@example.com", "save", &[("scan.pdf", "first")]));
    mailbox.add(msg("b", UNREAD_PERSONAL, "authorized@example.com", "save", &[("scan.pdf", "second")]));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let pipeline = Pipeline::new(&mailbox, &printer, &cfg);
    pipeline.process("a");
    pipeline.process("b");

    assert_eq!(fs::read(dir.path().join("scan.pdf")).unwrap(), b"second");
}

// ─── Failure containment ────────────────────────────────────────────

#[test]
fn bad_attachment_keeps_message_unread_with_on_success_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach_raw("BAD", "@@@@");
    mailbox.add(msg("m", UNREAD_PERSONAL, "authorized@example.com", "print", &[("x.pdf", "BAD")]));
    let printer = RecordingPrinter::default();
    let mut cfg = pipeline_config(dir.path());
    cfg.finalize = FinalizePolicy::OnSuccess;

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("m");

    assert!(matches!(
        out,
        MessageOutcome::Failed { error: ProcessError::Decode { .. }, marked_read: false, .. }
    ));
    assert!(mailbox.modifications().is_empty());
    assert!(printer.jobs().is_empty());
}

#[test]
fn bad_attachment_is_still_marked_read_with_always_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach_raw("BAD", "@@@@");
    mailbox.add(msg("m", UNREAD_PERSONAL, "authorized@example.com", "save", &[("x.pdf", "BAD")]));
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());

    let out = Pipeline::new(&mailbox, &printer, &cfg).process("m");

    assert!(matches!(out, MessageOutcome::Failed { marked_read: true, .. }));
    assert_eq!(mailbox.modifications(), vec![("m".to_string(), vec!["UNREAD".to_string()])]);
}

#[test]
fn one_broken_message_does_not_stop_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    mailbox.attach_raw("BAD", "@@@@");
    mailbox.attach("GOOD", b"good bytes");
    mailbox.add(msg("broken", UNREAD_PERSONAL, "authorized@example.com", "print", &[("bad.pdf", "BAD")]));
    mailbox.add(msg("fine", UNREAD_PERSONAL, "authorized@example.com", "print", &[("good.pdf", "GOOD")]));
    mailbox.add(msg("old", &["CATEGORY_PERSONAL"], "authorized@example.com", "print", &[]));
    mailbox.add(msg("spam", UNREAD_PERSONAL, "x@spam.example", "print", &[]));
    let printer = RecordingPrinter::default();
    let mut cfg = pipeline_config(dir.path());
    cfg.finalize = FinalizePolicy::OnSuccess;
    let pool = build_pool(3).unwrap();

    let (summary, outcomes) = run_cycle(&mailbox, &printer, &cfg, &pool, None).unwrap();

    let ids: Vec<_> = outcomes.iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec!["broken", "fine", "old", "spam"]);
    assert_eq!(summary.listed, 4);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.files_printed, 1);
    assert!(summary.has_failures());

    assert_eq!(printer.jobs(), vec![dir.path().join("good.pdf")]);
    assert_eq!(mailbox.modifications(), vec![("fine".to_string(), vec!["UNREAD".to_string()])]);
}

#[test]
fn listing_failure_fails_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = Mailbox {
        fail_list: true,
        ..Default::default()
    };
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());
    let pool = build_pool(1).unwrap();

    assert!(run_cycle(&mailbox, &printer, &cfg, &pool, None).is_err());
}

#[test]
fn every_message_is_finalized_at_most_once_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = Mailbox::default();
    for i in 0..20 {
        let att = format!("att{i}");
        mailbox.attach(&att, format!("payload {i}").as_bytes());
        let name = format!("file{i}.pdf");
        mailbox.add(msg(
            &format!("m{i}"),
            UNREAD_PERSONAL,
            "authorized@example.com",
            if i % 2 == 0 { "print" } else { "save" },
            &[(name.as_str(), att.as_str())],
        ));
    }
    let printer = RecordingPrinter::default();
    let cfg = pipeline_config(dir.path());
    let pool = build_pool(4).unwrap();

    let (summary, _) = run_cycle(&mailbox, &printer, &cfg, &pool, None).unwrap();

    assert_eq!(summary.processed, 20);
    assert_eq!(summary.files_saved, 20);
    assert_eq!(summary.files_printed, 10);
    let mut finalized: Vec<_> = mailbox.modifications().into_iter().map(|(id, _)| id).collect();
    finalized.sort();
    finalized.dedup();
    assert_eq!(finalized.len(), 20);
    assert_eq!(mailbox.modifications().len(), 20);
}
