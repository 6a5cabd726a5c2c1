use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::Utc;
use muhasib_auth::{Principal, Role};
use muhasib_core::{AccountId, OrganizationId, UserId};
use muhasib_events::{EventEnvelope, InMemoryEventBus};
use muhasib_infra::posting::{DraftEntry, PostingEngine};
use muhasib_infra::projector::BalanceProjector;
use muhasib_infra::store::{InMemoryLedgerStore, LedgerStore};
use muhasib_ledger::{Account, AccountType, EntryType, JournalEntryLine};

type Engine =
    PostingEngine<Arc<InMemoryLedgerStore>, Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>>;

struct Harness {
    engine: Engine,
    store: Arc<InMemoryLedgerStore>,
    org: OrganizationId,
    accountant: Principal,
    cash: AccountId,
    revenue: AccountId,
}

fn setup() -> Harness {
    let store = Arc::new(InMemoryLedgerStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
        Arc::new(InMemoryEventBus::new());
    let engine = PostingEngine::new(store.clone(), bus);

    let org = OrganizationId::new();
    store.init_organization(org).unwrap();
    let accountant = Principal::new(UserId::new(), org, vec![Role::new("accountant")]);
    let cash = engine
        .create_account(
            &accountant,
            org,
            Account::new("1000", "Cash", AccountType::Asset, "SAR"),
        )
        .unwrap();
    let revenue = engine
        .create_account(
            &accountant,
            org,
            Account::new("4000", "Revenue", AccountType::Revenue, "SAR"),
        )
        .unwrap();

    Harness {
        engine,
        store,
        org,
        accountant,
        cash,
        revenue,
    }
}

fn post_one(h: &Harness, amount: i64) {
    let entry = h
        .engine
        .create_draft(
            &h.accountant,
            DraftEntry {
                organization_id: h.org,
                entry_date: Utc::now(),
                description: "Bench entry".to_string(),
                entry_type: EntryType::Auto,
                lines: vec![
                    JournalEntryLine::debit(h.cash, amount),
                    JournalEntryLine::credit(h.revenue, amount),
                ],
            },
        )
        .unwrap();
    h.engine.post(&h.accountant, h.org, entry.id()).unwrap();
}

fn bench_posting_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting_latency");
    group.sample_size(1000);

    group.bench_function("draft_and_post_two_lines", |b| {
        let h = setup();
        b.iter(|| post_one(&h, black_box(100)));
    });

    group.finish();
}

fn bench_balance_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_recompute");

    for history_len in [100u64, 1_000, 10_000] {
        let h = setup();
        for _ in 0..history_len {
            post_one(&h, 10);
        }
        let projector = BalanceProjector::new(h.store.clone());

        group.throughput(Throughput::Elements(history_len));
        group.bench_with_input(
            BenchmarkId::new("balance_as_of", history_len),
            &history_len,
            |b, _| {
                b.iter(|| {
                    projector
                        .balance_as_of(h.org, black_box(h.cash), Utc::now())
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_posting_latency, bench_balance_recompute);
criterion_main!(benches);
