use tonepool::config::PoolConfig;
use tonepool::nodes::{RtrbSink, Waveform};
use tonepool::voice::{AudioPlatform, DeviceState, Op, RecordingPlatform, ToneDescriptor, VoicePool, FADE_FLOOR};
use tonepool::{Engine, Session, SessionConfig};

type Pool = VoicePool<RecordingPlatform>;

fn pool() -> Pool {
    VoicePool::new(RecordingPlatform::new(), &PoolConfig::default())
}

fn tone(frequency: f64, fade: f64) -> ToneDescriptor {
    ToneDescriptor::new(Waveform::Sine, frequency, 50.0, fade)
}

fn count(ops: &[Op], pred: impl Fn(&Op) -> bool) -> usize {
    ops.iter().filter(|op| pred(op)).count()
}

/// Every voice the platform still has wired is either live or fading.
fn assert_no_orphans(pool: &Pool) {
    assert_eq!(
        pool.platform().connected().len(),
        pool.live_len() + pool.fading_len(),
        "wired voices don't match pool bookkeeping"
    );
}

#[test]
fn scenario_a_repeated_snapshot_is_a_no_op() {
    let a = tone(440.0, 0.5);
    let mut pool = pool();

    pool.reconcile(&[a.clone()]);
    pool.reconcile(&[a.clone()]);

    let ops = pool.platform().ops();
    assert_eq!(count(ops, |op| matches!(op, Op::CreateGenerator { .. })), 1);
    assert_eq!(count(ops, |op| matches!(op, Op::RampLevel { .. })), 0);
    assert_eq!(count(ops, |op| matches!(op, Op::Stop { .. })), 0);
    assert_eq!(pool.stats().created, 1);
    assert_eq!(pool.stats().faded, 0);
    assert_eq!(pool.stats().released, 0);
}

#[test]
fn scenario_b_removed_tone_fades_then_releases() {
    let a = tone(440.0, 0.75);
    let mut pool = pool();

    pool.reconcile(&[a.clone()]);
    pool.platform_mut().set_now(2.0);
    pool.reconcile(&[]);

    assert!(!pool.contains(&a));
    let fading: Vec<_> = pool.fading().collect();
    assert_eq!(fading.len(), 1);
    assert_eq!(fading[0].state(), DeviceState::Fading);
    assert_eq!(fading[0].fade_started_at(), Some(2.0));

    let ramp_end = pool
        .platform()
        .ops()
        .iter()
        .find_map(|op| match op {
            Op::RampLevel { value, time, .. } => {
                assert_eq!(*value, FADE_FLOOR);
                Some(*time)
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(ramp_end, 2.75);

    // still sounding right up to the end of its ramp
    pool.platform_mut().set_now(ramp_end);
    assert_eq!(pool.tick(), 0);
    assert_eq!(pool.platform().connected().len(), 1);

    let release_at = pool.next_release_at().unwrap();
    assert!(release_at > ramp_end);
    assert!(release_at - ramp_end <= 0.1 + 1e-9);

    pool.platform_mut().set_now(release_at);
    assert_eq!(pool.tick(), 1);
    assert!(pool.platform().connected().is_empty());
    assert!(matches!(
        pool.platform().ops().last(),
        Some(Op::Unwire { .. })
    ));
}

#[test]
fn scenario_c_survivor_is_untouched() {
    let a = tone(440.0, 0.5);
    let b = tone(660.0, 0.5);
    let mut pool = pool();

    pool.reconcile(&[a.clone(), b.clone()]);
    let b_key = b.key().unwrap();
    let b_stage = *pool.device(&b_key).unwrap().stage();
    let b_id = pool.device(&b_key).unwrap().id();
    pool.platform_mut().take_ops();

    pool.reconcile(&[b.clone()]);

    assert!(!pool.contains(&a));
    assert_eq!(pool.fading_len(), 1);
    assert_eq!(pool.device(&b_key).unwrap().id(), b_id);

    let ops = pool.platform().ops();
    assert_eq!(count(ops, |op| matches!(op, Op::CreateGenerator { .. })), 0);
    let touches_b = |op: &Op| match op {
        Op::SetLevel { stage, .. } | Op::RampLevel { stage, .. } => *stage == b_stage,
        Op::Unwire { stage, .. } => *stage == b_stage,
        _ => false,
    };
    assert_eq!(count(ops, touches_b), 0);
}

#[test]
fn scenario_d_volume_change_cross_fades() {
    let a = tone(440.0, 1.0);
    let louder = ToneDescriptor { volume: 80.0, ..a.clone() };
    let mut pool = pool();

    pool.reconcile(&[a.clone()]);
    pool.platform_mut().advance(0.5);
    pool.reconcile(&[louder.clone()]);

    assert!(pool.contains(&louder));
    assert!(!pool.contains(&a));
    assert_eq!(pool.live_len(), 1);
    assert_eq!(pool.fading_len(), 1);
    // both audible while the old one rings down
    assert_eq!(pool.platform().connected().len(), 2);

    let old = pool.fading().next().unwrap();
    assert_eq!(old.descriptor(), &a);
    assert_eq!(old.release_at(), Some(0.5 + 1.0 + 0.1));

    pool.platform_mut().advance(2.0);
    pool.tick();
    assert_eq!(pool.platform().connected().len(), 1);
    assert!(pool.contains(&louder));
}

#[test]
fn retrigger_while_fading_starts_a_fresh_voice() {
    let a = tone(440.0, 1.0);
    let mut pool = pool();

    pool.reconcile(&[a.clone()]);
    pool.platform_mut().advance(0.1);
    pool.reconcile(&[]);
    pool.platform_mut().advance(0.1);
    pool.reconcile(&[a.clone()]);

    assert_eq!(pool.live_len(), 1);
    assert_eq!(pool.fading_len(), 1);
    assert_eq!(pool.stats().created, 2);

    let key = a.key().unwrap();
    let fresh = pool.device(&key).unwrap();
    assert_eq!(fresh.state(), DeviceState::Sounding);
    assert_ne!(fresh.id(), pool.fading().next().unwrap().id());
    assert_no_orphans(&pool);
}

#[test]
fn empty_snapshot_fades_everything_at_once() {
    let mut pool = pool();
    pool.reconcile(&[tone(220.0, 0.2), tone(330.0, 0.4), tone(440.0, 0.0)]);
    pool.reconcile(&[]);

    assert_eq!(pool.live_len(), 0);
    assert_eq!(pool.fading_len(), 3);
    assert_eq!(pool.live_keys().count(), 0);

    // each releases on its own schedule, shortest fade first
    let mut released = Vec::new();
    for step in 1..=10 {
        pool.platform_mut().set_now(step as f64 * 0.1);
        released.push(pool.tick());
    }
    assert_eq!(released.iter().sum::<usize>(), 3);
    assert_eq!(pool.fading_len(), 0);
    assert_no_orphans(&pool);
}

#[test]
fn zero_fade_ramps_before_a_deferred_stop() {
    let mut pool = pool();
    pool.reconcile(&[tone(440.0, 0.0)]);
    pool.platform_mut().take_ops();

    pool.reconcile(&[]);
    let ops = pool.platform_mut().take_ops();
    assert!(ops.iter().any(|op| matches!(op, Op::RampLevel { .. })));
    assert!(!ops.iter().any(|op| matches!(op, Op::Stop { .. })));

    // not even a zero fade releases in the same instant
    assert_eq!(pool.tick(), 0);
    pool.platform_mut().advance(0.1);
    assert_eq!(pool.tick(), 1);
}

#[test]
fn at_most_one_voice_per_tone_under_churn() {
    let tones = [
        tone(220.0, 0.05),
        tone(330.0, 0.3),
        ToneDescriptor::new(Waveform::Square, 220.0, 25.0, 0.1),
        tone(440.0, 0.0).with_octave(-1),
    ];
    let snapshots: [&[usize]; 8] = [
        &[0],
        &[0, 1],
        &[1, 2, 2],
        &[],
        &[3, 0],
        &[0, 1, 2, 3],
        &[2],
        &[2, 0, 0, 1],
    ];

    let mut pool = pool();
    for snapshot in snapshots.iter().cycle().take(40) {
        let desired: Vec<ToneDescriptor> = snapshot.iter().map(|&i| tones[i].clone()).collect();
        pool.reconcile(&desired);

        let mut distinct: Vec<_> = desired.iter().map(|t| t.key().unwrap()).collect();
        distinct.sort();
        distinct.dedup();
        assert_eq!(pool.live_len(), distinct.len());
        for descriptor in &desired {
            assert!(pool.contains(descriptor));
        }
        assert_no_orphans(&pool);

        pool.platform_mut().advance(0.07);
        pool.tick();
        assert_no_orphans(&pool);
    }

    let stats = pool.stats();
    assert_eq!(stats.created, stats.faded + pool.live_len() as u64);
    assert_eq!(stats.faded, stats.released + pool.fading_len() as u64);
}

#[test]
fn every_release_follows_its_ramp() {
    let mut pool = pool();
    let mut ramp_ends = std::collections::HashMap::new();

    for round in 0..20 {
        let frequency = 200.0 + (round % 5) as f64 * 100.0;
        pool.reconcile(&[tone(frequency, (round % 3) as f64 * 0.05)]);
        pool.platform_mut().advance(0.03);

        for op in pool.platform_mut().take_ops() {
            match op {
                Op::RampLevel { stage, time, .. } => {
                    ramp_ends.insert(stage, time);
                }
                Op::Unwire { stage, .. } => panic!("release during reconcile: {stage:?}"),
                _ => {}
            }
        }

        pool.tick();
        let now = pool.platform().now();
        for op in pool.platform_mut().take_ops() {
            if let Op::Unwire { stage, .. } = op {
                let ramp_end = ramp_ends[&stage];
                assert!(now > ramp_end, "released at {now}, ramp ends at {ramp_end}");
            }
        }
    }
}

fn render_block(session: &mut Session, consumer: &mut rtrb::Consumer<f32>) -> Vec<f32> {
    session.render(1);
    std::iter::from_fn(|| consumer.pop().ok()).collect()
}

#[test]
fn offline_render_returns_to_silence() {
    let (producer, mut consumer) = rtrb::RingBuffer::new(1 << 12);
    let engine = Engine::new(48_000, 1).with_output(RtrbSink::mono(producer));
    let mut session = Session::with_engine(engine, &SessionConfig::default());
    let baseline = session.engine().unwrap().node_count();

    let a = ToneDescriptor::new(Waveform::Sine, 440.0, 50.0, 0.05);
    session.apply(&[a]);
    assert_eq!(session.engine().unwrap().node_count(), baseline + 2);

    let mut sounding = Vec::new();
    for _ in 0..20 {
        sounding.extend(render_block(&mut session, &mut consumer));
    }
    let peak = sounding.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.45 && peak <= 0.5, "peak was {peak}");

    session.apply(&[]);
    // 0.05 s ramp is 37.5 blocks, release follows 0.1 s later
    let mut blocks = Vec::new();
    for _ in 0..150 {
        blocks.push(render_block(&mut session, &mut consumer));
    }

    let pool = session.pool().unwrap();
    assert_eq!(pool.fading_len(), 0);
    assert_eq!(pool.stats().released, 1);
    assert_eq!(session.engine().unwrap().node_count(), baseline);

    // the fade is monotone down to the floor, then silence
    let block_peak = |block: &Vec<f32>| block.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(block_peak(&blocks[10]) < block_peak(&blocks[0]));
    for block in &blocks[40..] {
        assert!(block_peak(block) < 1e-4);
    }
    for block in &blocks[145..] {
        assert!(block.iter().all(|s| *s == 0.0));
    }

    // the scope saw the silence too
    let frame = session.scope_frame().unwrap();
    assert!(frame.samples.iter().all(|s| *s == 0.0));
}
