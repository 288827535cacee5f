use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dasp_graph::Buffer;
use tonepool::config::PoolConfig;
use tonepool::nodes::{Oscillator, OscillatorMessage, Waveform};
use tonepool::voice::{RecordingPlatform, ToneDescriptor, VoicePool};
use tonepool::{AudioNode, Engine, ProcessContext};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Oscillator.process()", |b| {
        let ctx = ProcessContext { sample_rate: 48_000, buffer_size: Buffer::LEN, frame: 0 };
        let mut source = Oscillator::new(Waveform::Triangle, 480.0);
        let mut output = [Buffer::default()];
        source.process(&ctx, std::iter::once(OscillatorMessage::Start), &[], &mut output);

        b.iter(|| source.process(&ctx, std::iter::empty(), &[], black_box(&mut output)))
    });

    c.bench_function("VoicePool.reconcile() churn", |b| {
        let chord: Vec<ToneDescriptor> = (0..8)
            .map(|i| ToneDescriptor::new(Waveform::Sine, 110.0 * (i + 1) as f64, 10.0, 0.2))
            .collect();
        let mut pool = VoicePool::new(RecordingPlatform::new(), &PoolConfig::default());

        b.iter(|| {
            pool.reconcile(black_box(&chord[..4]));
            pool.reconcile(black_box(&chord[2..]));
            pool.platform_mut().advance(0.5);
            pool.tick();
            pool.platform_mut().take_ops();
        })
    });

    c.bench_function("Engine.process() 16 voices", |b| {
        let mut pool = VoicePool::new(Engine::new(48_000, 2), &PoolConfig::default());
        let tones: Vec<ToneDescriptor> = (0..16)
            .map(|i| ToneDescriptor::new(Waveform::Sawtooth, 55.0 * (i + 1) as f64, 5.0, 1.0))
            .collect();
        pool.reconcile(&tones);

        b.iter(|| pool.platform_mut().process())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
