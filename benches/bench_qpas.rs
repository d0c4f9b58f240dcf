use config::AncestryConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use model::{DiscreteGenotypeMatrix, GenotypeModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_genotypes(individuals: usize, markers: usize, rng: &mut StdRng) -> GenotypeModel {
    let codes: Vec<i8> = (0..individuals * markers).map(|_| rng.gen_range(0..3)).collect();
    GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(individuals, markers, codes))
}

fn bench_qpas_iterations(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1864);
    let model = random_genotypes(50, 200, &mut rng);
    let ksize = 3;

    let mut group = c.benchmark_group("qpas");
    group.sample_size(20);

    group.bench_function("ten_iterations_50x200_k3", |bencher| {
        bencher.iter_batched(
            || {
                let mut seed_rng = StdRng::seed_from_u64(7);
                let q0 = qpas::randomize_q(model.height(), ksize, &mut seed_rng);
                let mu = model.create_mu(1e-6);
                let f0 = qpas::randomize_f(ksize, &mu, &mut seed_rng);
                (q0, f0)
            },
            |(q0, f0)| {
                let config = AncestryConfig { max_iterations: 10, ..Default::default() };
                black_box(qpas::run(&config, &model, q0, f0, None, 0).unwrap())
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_qpas_iterations);
criterion_main!(benches);
