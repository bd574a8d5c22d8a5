use criterion::{criterion_group, criterion_main, Criterion};
use engine::{FacetFilters, FittedModel, RecommendQuery, RecordInput, VectorizerConfig};

const AREAS: &[&str] = &["Chest", "Back", "Shoulders", "Quadriceps", "Hamstrings", "Abdominals"];
const EQUIPMENT: &[&str] = &["Barbell", "Dumbbell", "Cable", "Body Only", "Machine"];
const LEVELS: &[&str] = &["Beginner", "Intermediate", "Expert"];

fn corpus(n: usize) -> Vec<RecordInput> {
    (0..n)
        .map(|i| RecordInput {
            title: Some(format!("{} {} variation {i}", EQUIPMENT[i % 5], AREAS[i % 6])),
            description: Some(format!("A {} exercise targeting the {}", LEVELS[i % 3], AREAS[(i / 3) % 6])),
            category: Some("Strength".into()),
            target_area: Some(AREAS[i % 6].into()),
            equipment: Some(EQUIPMENT[i % 5].into()),
            level: Some(LEVELS[i % 3].into()),
            rating: (i % 7 != 0).then(|| (i % 10) as f32),
            ..Default::default()
        })
        .collect()
}

fn bench_recommend(c: &mut Criterion) {
    let inputs = corpus(3000);
    c.bench_function("fit_3000", |b| b.iter(|| FittedModel::fit(inputs.clone(), VectorizerConfig::default())));

    let model = FittedModel::fit(inputs, VectorizerConfig::default());
    let query = RecommendQuery {
        filters: FacetFilters { target_area: Some("chest".into()), level: Some("beginner".into()), ..Default::default() },
        ..Default::default()
    };
    c.bench_function("recommend_chest_beginner", |b| b.iter(|| model.recommend(&query)));
    c.bench_function("similar_top10", |b| b.iter(|| model.similar(42, 10)));
}

criterion_group!(benches, bench_recommend);
criterion_main!(benches);
