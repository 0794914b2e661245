//! Benchmarks for the pure text paths run on every tracker request.
//!
//! - `sanitize` on model-written queries of varying shape.
//! - `markdown_to_document` on drafted descriptions with the origin footer.
//! - A full explicit-create turn through the engine with mock collaborators.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use jarvis_chat::mock::MockSet;
use jarvis_chat::{
    markdown_to_document, sanitize, CommandParser, ConversationEngine, DraftStore,
    EngineSettings, IncomingMessage,
};
use jarvis_core::types::ThreadKey;

/// Queries the canonicalizer sees in practice, ungrouped ones included.
fn sample_queries() -> Vec<String> {
    vec![
        "project = BE AND text ~ \"login\" OR text ~ \"senha\" OR text ~ \"login\" ORDER BY updated DESC"
            .to_string(),
        "project in (BE, OPS)   AND   description ~ \"export\"   ORDER BY created DESC".to_string(),
        "project = OPS AND (status = Open OR status = Reopened)".to_string(),
        "issuetype = Bug AND statusCategory != Done ORDER BY updated DESC".to_string(),
    ]
}

/// A description shaped like what the extractor drafts, footer included.
fn generate_description(index: usize) -> String {
    format!(
        "## Contexto\n\
         O export de relatórios falha para clientes com mais de **mil** linhas.\n\
         \n\
         ## Critérios de aceite\n\
         - [ ] Export conclui em menos de 30s\n\
         - [x] Mensagem de erro clara\n\
         - [ ] Teste automatizado cobrindo o caso\n\
         \n\
         ## Notas\n\
         * Reportado por suporte\n\
         * Afeta o plano **enterprise**\n\
         \n\
         ---\n\
         Thread de origem\n\
         \n\
         - Mensagem original: https://chat.example/C1/p{}\n\
         - Thread (raiz): https://chat.example/C1/p1700\n",
        index
    )
}

fn bench_sanitize(c: &mut Criterion) {
    let queries = sample_queries();

    let mut group = c.benchmark_group("query_canonicalizer");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("sanitize_mixed", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let out = sanitize(&queries[idx % queries.len()]);
            idx += 1;
            out
        });
    });

    group.bench_function("sanitize_idempotent_pass", |b| {
        let once: Vec<String> = queries.iter().map(|q| sanitize(q)).collect();
        b.iter(|| once.iter().map(|q| sanitize(q)).collect::<Vec<_>>());
    });

    group.finish();
}

fn bench_markdown(c: &mut Criterion) {
    let descriptions: Vec<String> = (0..100).map(generate_description).collect();

    let mut group = c.benchmark_group("markdown_to_document");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("convert", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let doc = markdown_to_document(&descriptions[idx % descriptions.len()]);
            idx += 1;
            doc
        });
    });

    group.bench_function("convert_and_serialize", |b| {
        b.iter(|| markdown_to_document(&descriptions[0]).to_value());
    });

    group.finish();
}

fn bench_explicit_turn(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    let mocks = MockSet::default();
    let engine = ConversationEngine::new(
        CommandParser::default(),
        std::sync::Arc::new(DraftStore::new(chrono::Duration::minutes(120))),
        mocks.collaborators(),
        EngineSettings::default(),
    );

    let mut group = c.benchmark_group("conversation_engine");
    group.sample_size(100);

    group.bench_function("explicit_create_turn", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let msg = IncomingMessage::new(
                ThreadKey::new("C1", format!("1700.{}", idx)),
                format!("1700.{}", idx),
                "jira criar | BE | Bug | Export falha | ## Contexto\n- passo **1**",
            );
            idx += 1;
            rt.block_on(engine.handle_message(&msg))
                .expect("turn failed")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sanitize, bench_markdown, bench_explicit_turn);
criterion_main!(benches);
