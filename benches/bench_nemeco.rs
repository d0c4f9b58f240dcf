use config::CovarianceConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use model::{DiscreteGenotypeMatrix, GenotypeModel};
use nemeco::CovarianceInput;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn fixture(markers: usize, ksize: usize, rng: &mut StdRng) -> (GenotypeModel, matrix::Matrix) {
    let individuals = 20;
    let codes: Vec<i8> = (0..individuals * markers).map(|_| rng.gen_range(0..3)).collect();
    let model = GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(individuals, markers, codes));

    let mut f = matrix::Matrix::new(ksize, markers);
    for v in f.data_mut().iter_mut() {
        *v = rng.gen_range(0.05..0.95);
    }
    (model, f)
}

fn bench_nemeco_treeless(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1864);
    let (model, f) = fixture(500, 3, &mut rng);

    let mut group = c.benchmark_group("nemeco");
    group.sample_size(20);

    group.bench_function("treeless_500markers_k3", |bencher| {
        bencher.iter(|| {
            let config = CovarianceConfig { max_iterations: 100, ..Default::default() };
            black_box(nemeco::run(&config, &model, &f, CovarianceInput::Treeless).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_nemeco_treeless);
criterion_main!(benches);
