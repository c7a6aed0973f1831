use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use asm_view::backend::Backend;
use asm_view::error::{BackendError, HubError};
use asm_view::event_hub::{ASM_UPDATE, CLOSE_REQUESTED, PROJECT_UPDATE, TAURI_CLOSE_REQUESTED};
use asm_view::hover::HoverDetail;
use asm_view::protocol::Outbound;
use asm_view::request_handler::dispatch_message;
use asm_view::storage::{MemoryStorage, Storage, SNAPSHOT_KEY};
use asm_view::{
    ActiveView, Event, EventHub, RawInstruction, Session, UiNotifier, Upstream,
    DATA_WORD_OPCODE_ID,
};

#[derive(Default)]
struct CountingUpstream {
    opened: Mutex<Vec<String>>,
}

impl Upstream for CountingUpstream {
    fn open(&self, event: &str) -> Result<(), HubError> {
        self.opened.lock().unwrap().push(event.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    views: Mutex<Vec<ActiveView>>,
    offline: AtomicBool,
}

impl UiNotifier for RecordingNotifier {
    fn switch_view(&self, view: ActiveView) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("ui not connected");
        }
        self.views.lock().unwrap().push(view);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingOutbound {
    sent: Mutex<Vec<Value>>,
}

impl Outbound for RecordingOutbound {
    fn send(&self, msg: &Value) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

struct TableBackend {
    fetches: Arc<AtomicUsize>,
}

impl Backend for TableBackend {
    async fn get_instruction_list(&self) -> Result<Vec<RawInstruction>, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(vec![raw("nop", "No Operation"), raw("ldi", "Load Immediate")])
    }

    async fn get_mcu_list(&self) -> Result<BTreeSet<String>, BackendError> {
        Ok(BTreeSet::from(["ATmega328P".to_string(), "ATtiny85".to_string()]))
    }
}

fn raw(opcode: &str, description: &str) -> RawInstruction {
    RawInstruction {
        opcode: opcode.to_string(),
        len: 1,
        name: opcode.to_uppercase(),
        constraints: None,
        bin_mask: 0xffff,
        bin_opcode: 0,
        action: String::new(),
        description: description.to_string(),
    }
}

struct Fixture {
    upstream: Arc<CountingUpstream>,
    notifier: Arc<RecordingNotifier>,
    storage: Arc<dyn Storage>,
    fetches: Arc<AtomicUsize>,
    session: Arc<Session<TableBackend>>,
}

fn fixture_with(storage: Arc<dyn Storage>) -> Fixture {
    let upstream = Arc::new(CountingUpstream::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let fetches = Arc::new(AtomicUsize::new(0));
    let hub = Arc::new(EventHub::new(upstream.clone()));
    let session = Session::new(
        hub,
        storage.clone(),
        TableBackend {
            fetches: fetches.clone(),
        },
        notifier.clone(),
        HoverDetail::new(Duration::ZERO),
    )
    .expect("session wiring");
    Fixture {
        upstream,
        notifier,
        storage,
        fetches,
        session: Arc::new(session),
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(MemoryStorage::new()))
}

fn listing(n: u32) -> Value {
    let rows: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "address": i * 2,
                "opcodeId": 1,
                "operands": [{"constraint": "d", "value": 16 + i}, {"constraint": "M", "value": 255}],
                "comment": "10",
                "commentDisplay": "Hex"
            })
        })
        .collect();
    Value::Array(rows)
}

fn push(f: &Fixture, name: &str, payload: Value) -> usize {
    f.session.hub.dispatch(&Event::new(name, payload))
}

#[test]
fn wiring_opens_each_event_once() {
    let f = fixture();
    let opened = f.upstream.opened.lock().unwrap().clone();
    assert_eq!(
        opened,
        vec![
            ASM_UPDATE.to_string(),
            CLOSE_REQUESTED.to_string(),
            TAURI_CLOSE_REQUESTED.to_string(),
            PROJECT_UPDATE.to_string(),
        ]
    );

    // a second listener on an already-open event stays local
    f.session.hub.subscribe(ASM_UPDATE, |_| Ok(())).unwrap();
    assert_eq!(f.upstream.opened.lock().unwrap().len(), 4);
    assert_eq!(push(&f, ASM_UPDATE, listing(1)), 2);
}

#[test]
fn update_replaces_instead_of_merging() {
    let f = fixture();
    push(&f, ASM_UPDATE, listing(5));
    assert_eq!(f.session.snapshots.snapshot().unwrap().len(), 5);

    push(&f, ASM_UPDATE, listing(3));
    let snapshot = f.session.snapshots.snapshot().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[2].address, 4);
    assert_eq!(
        *f.notifier.views.lock().unwrap(),
        vec![ActiveView::Disassembly, ActiveView::Disassembly]
    );
}

#[test]
fn update_survives_reload_and_marker_is_one_shot() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let first = fixture_with(storage.clone());
    first.notifier.offline.store(true, Ordering::SeqCst);
    push(&first, ASM_UPDATE, listing(4));

    let reloaded = fixture_with(storage);
    assert_eq!(reloaded.session.snapshots.snapshot().unwrap().len(), 4);
    assert_eq!(
        reloaded.session.snapshots.take_active_view().unwrap(),
        Some(ActiveView::Disassembly)
    );
    assert_eq!(reloaded.session.snapshots.take_active_view().unwrap(), None);
}

#[test]
fn delivered_switch_consumes_marker() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let first = fixture_with(storage.clone());
    push(&first, ASM_UPDATE, listing(2));
    assert_eq!(first.notifier.views.lock().unwrap().len(), 1);

    let reloaded = fixture_with(storage);
    assert_eq!(reloaded.session.snapshots.snapshot().unwrap().len(), 2);
    assert_eq!(reloaded.session.snapshots.take_active_view().unwrap(), None);
}

#[test]
fn close_after_update_leaves_no_marker() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let first = fixture_with(storage.clone());
    first.notifier.offline.store(true, Ordering::SeqCst);
    push(&first, ASM_UPDATE, listing(1));
    push(&first, CLOSE_REQUESTED, Value::Null);

    let reopened = fixture_with(storage);
    assert!(reopened.session.snapshots.is_empty());
    assert_eq!(reopened.session.snapshots.take_active_view().unwrap(), None);
}

#[test]
fn close_events_clear_the_snapshot() {
    for close in [CLOSE_REQUESTED, TAURI_CLOSE_REQUESTED] {
        let f = fixture();
        push(&f, ASM_UPDATE, listing(2));
        push(&f, close, Value::Null);
        assert!(f.session.snapshots.is_empty(), "{}", close);
        assert_eq!(f.storage.get(SNAPSHOT_KEY).unwrap(), None);
    }
}

#[test]
fn empty_update_means_project_closed() {
    let f = fixture();
    push(&f, ASM_UPDATE, listing(2));
    push(&f, ASM_UPDATE, Value::Null);
    assert!(f.session.snapshots.is_empty());
    assert_eq!(f.notifier.views.lock().unwrap().len(), 1);
}

#[test]
fn malformed_update_keeps_previous_snapshot() {
    let f = fixture();
    push(&f, ASM_UPDATE, listing(2));
    push(&f, ASM_UPDATE, json!({"not": "a list"}));
    assert_eq!(f.session.snapshots.snapshot().unwrap().len(), 2);
}

#[tokio::test]
async fn rows_render_with_one_fetch() {
    let f = fixture();
    push(&f, ASM_UPDATE, listing(3));

    let rows = f.session.rows().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].mnemonic, "ldi");
    assert_eq!(rows[0].operands, ["r16".to_string(), "0xff".to_string(), String::new()]);
    assert_eq!(rows[0].comment, Ok("0xa".to_string()));
    assert_eq!(f.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_opcode_only_affects_its_row() {
    let f = fixture();
    push(
        &f,
        ASM_UPDATE,
        json!([
            {"address": 0, "opcodeId": 0, "operands": []},
            {"address": 2, "opcodeId": 77, "operands": []},
            {"address": 4, "opcodeId": DATA_WORD_OPCODE_ID, "operands": null, "comment": 4660, "commentDisplay": "Hex"}
        ]),
    );
    let rows = f.session.rows().await.unwrap();
    assert_eq!(rows[0].mnemonic, "nop");
    assert!(rows[1].mnemonic.contains("77"));
    assert_eq!(rows[2].mnemonic, ".word");
    assert_eq!(rows[2].comment, Ok("0x1234".to_string()));

    assert!(f.session.detail(77).await.is_err());
    assert_eq!(f.session.detail(DATA_WORD_OPCODE_ID).await.unwrap().opcode, ".word");
}

#[tokio::test]
async fn device_change_refetches_table() {
    let f = fixture();
    push(&f, PROJECT_UPDATE, json!({"mcu": "ATmega328P"}));
    f.session.detail(0).await.unwrap();
    push(&f, PROJECT_UPDATE, json!({"mcu": "ATmega328P"}));
    f.session.detail(0).await.unwrap();
    assert_eq!(f.fetches.load(Ordering::SeqCst), 1);

    push(&f, PROJECT_UPDATE, json!({"mcu": "ATtiny85"}));
    f.session.detail(0).await.unwrap();
    assert_eq!(f.fetches.load(Ordering::SeqCst), 2);
    // the snapshot is not touched by a device change
    assert!(f.session.snapshots.is_empty());
}

#[tokio::test]
async fn request_messages_get_responses() {
    let f = fixture();
    let recorder = Arc::new(RecordingOutbound::default());
    let out: Arc<dyn Outbound> = recorder.clone();

    assert!(dispatch_message(&json!({"event": "asm-update", "payload": listing(2)}), &f.session, &out).await);
    assert!(dispatch_message(&json!({"req": "rows", "seq": 7}), &f.session, &out).await);
    assert!(dispatch_message(&json!({"req": "detail", "seq": 8, "opcodeId": 0}), &f.session, &out).await);
    assert!(dispatch_message(&json!({"req": "detail", "seq": 9, "opcodeId": 50}), &f.session, &out).await);
    assert!(dispatch_message(&json!({"req": "clear", "seq": 10}), &f.session, &out).await);
    assert!(!dispatch_message(&json!({"req": "bogus"}), &f.session, &out).await);

    let sent = recorder.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0]["seq"], 7);
    assert_eq!(sent[0]["rows"].as_array().unwrap().len(), 2);
    assert_eq!(sent[0]["rows"][1]["operands"][0], "r17");
    assert_eq!(sent[1]["detail"]["description"], "No Operation");
    assert!(sent[2]["error"].as_str().unwrap().contains("50"));
    assert_eq!(sent[3]["ok"], true);
    assert!(f.session.snapshots.is_empty());
}

async fn hover_notifications(recorder: &RecordingOutbound) -> Vec<Value> {
    // the detail is produced by a spawned task, give it a chance to run
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    recorder
        .sent
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m["method"] == "hoverDetail")
        .cloned()
        .collect()
}

#[tokio::test]
async fn hover_request_sends_detail() {
    let f = fixture();
    let recorder = Arc::new(RecordingOutbound::default());
    let out: Arc<dyn Outbound> = recorder.clone();
    push(&f, ASM_UPDATE, listing(2));

    assert!(dispatch_message(&json!({"req": "hover", "seq": 1, "address": 2}), &f.session, &out).await);
    let sent = hover_notifications(&recorder).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["params"]["address"], 2);
    assert_eq!(sent[0]["params"]["instruction"]["opcode"], "ldi");

    // no row at that address
    assert!(!dispatch_message(&json!({"req": "hover", "seq": 2, "address": 3}), &f.session, &out).await);
}

#[tokio::test]
async fn hover_leave_suppresses_detail() {
    let f = fixture();
    let recorder = Arc::new(RecordingOutbound::default());
    let out: Arc<dyn Outbound> = recorder.clone();
    push(&f, ASM_UPDATE, listing(2));

    assert!(dispatch_message(&json!({"req": "hover", "seq": 1, "address": 0}), &f.session, &out).await);
    assert!(dispatch_message(&json!({"req": "hoverLeave", "seq": 2}), &f.session, &out).await);
    assert!(hover_notifications(&recorder).await.is_empty());
    assert_eq!(f.session.hover.visible(), None);
}

#[tokio::test]
async fn hover_detail_is_suppressed_after_leave() {
    let f = fixture();
    push(&f, ASM_UPDATE, listing(2));

    let ticket = f.session.hover.enter(0);
    assert!(f
        .session
        .hover
        .show_after_delay(ticket, 1, &f.session.metadata)
        .await
        .unwrap());
    assert_eq!(f.session.hover.visible().unwrap().instruction.opcode, "ldi");

    let ticket = f.session.hover.enter(2);
    f.session.hover.leave();
    assert!(!f
        .session
        .hover
        .show_after_delay(ticket, 1, &f.session.metadata)
        .await
        .unwrap());
    assert_eq!(f.session.hover.visible(), None);
}

#[tokio::test]
async fn device_list_passthrough() {
    let f = fixture();
    let devices = f.session.metadata.devices().await.unwrap();
    assert_eq!(devices.len(), 2);
}
