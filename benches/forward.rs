use burn::backend::NdArray;
use burn::backend::ndarray::NdArrayDevice;
use burn::tensor::Tensor;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use filterbank::basis::filterbank_mel;
use filterbank::{Filterbank, FilterbankConfig, Layer, LayerBaseConfig};

const SAMPLE_RATE: u32 = 22_050;
const N_FREQ: usize = 513;
const N_MELS: usize = 128;

fn bench_mel_basis(c: &mut Criterion) {
    filterbank::logging::init(None).expect("logging init");
    c.bench_function("filterbank_mel_513x128", |b| {
        b.iter(|| {
            filterbank_mel(
                black_box(SAMPLE_RATE),
                black_box(N_FREQ),
                N_MELS,
                0.0,
                11_025.0,
            )
            .expect("mel basis")
        });
    });
}

fn bench_forward(c: &mut Criterion) {
    let device = NdArrayDevice::default();
    let mut layer = Filterbank::<NdArray>::new(
        FilterbankConfig::new(N_MELS, false).with_sample_rate(SAMPLE_RATE),
        LayerBaseConfig::default(),
    )
    .expect("layer config");
    layer
        .build(&[1, 1, N_FREQ, 1], &device)
        .expect("layer build");

    for frames in [100usize, 1_000] {
        let input = Tensor::<NdArray, 4>::ones([8, 1, N_FREQ, frames], &device);
        c.bench_with_input(BenchmarkId::new("forward", frames), &input, |b, input| {
            b.iter(|| layer.forward(black_box(input.clone())).expect("forward"));
        });
    }
}

criterion_group!(benches, bench_mel_basis, bench_forward);
criterion_main!(benches);
