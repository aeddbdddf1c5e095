//! Benchmarks for filtering, qualification and pipeline execution.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use leadflow::collaborators::Collaborators;
use leadflow::config::OrchestratorConfig;
use leadflow::leads::{CompanySize, FilterSpec, Lead};
use leadflow::orchestrator::Orchestrator;
use leadflow::qualification::{QualificationConfig, WeightedQualifier};
use leadflow::testing::{mock_inputs, mock_leads};

fn many_leads(copies: usize) -> Vec<Lead> {
    (0..copies)
        .flat_map(|i| {
            mock_leads().into_iter().map(move |mut lead| {
                lead.id = format!("{}-{i}", lead.id);
                lead
            })
        })
        .collect()
}

fn filter_benchmark(c: &mut Criterion) {
    let leads = many_leads(500);
    let spec = FilterSpec::new()
        .with_industries(["Technology", "Healthcare"])
        .with_company_sizes([CompanySize::Medium, CompanySize::Large])
        .with_include_keywords(["machine learning", "health"])
        .with_min_revenue(5_000_000);
    let now = Utc::now();

    c.bench_function("filter_3000_leads", |b| {
        b.iter(|| black_box(spec.apply(black_box(&leads), now)));
    });
}

fn qualification_benchmark(c: &mut Criterion) {
    let leads = many_leads(500);
    let Ok(qualifier) = WeightedQualifier::new(QualificationConfig::default()) else {
        return;
    };

    c.bench_function("qualify_3000_leads", |b| {
        b.iter(|| black_box(qualifier.qualify_leads(black_box(&leads))));
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
        return;
    };
    let Ok(definition) = Collaborators::in_memory(QualificationConfig::default())
        .and_then(|collaborators| collaborators.definition("bench"))
    else {
        return;
    };
    let orchestrator = Orchestrator::new(OrchestratorConfig::new().with_log_events(false));

    c.bench_function("in_memory_pipeline", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let Ok(id) = orchestrator.create_pipeline(&definition, mock_inputs()) else {
                    return;
                };
                let _ = black_box(orchestrator.wait(id).await);
                let _ = orchestrator.remove(id);
            });
        });
    });
}

criterion_group!(benches, filter_benchmark, qualification_benchmark, pipeline_benchmark);
criterion_main!(benches);
