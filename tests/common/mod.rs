//! Synthetic RAW files for tests
#![allow(dead_code)]
use echoraw::frame::encode_frame;

/// 2016-03-04 12:00:00 UTC in filetime ticks
pub const T0: u64 = 131_015_664_000_000_000;

/// One second in filetime ticks
pub const SECOND: u64 = 10_000_000;

pub fn fixed(s: &str, len: usize) -> Vec<u8> {
    let mut b = s.as_bytes().to_vec();
    b.resize(len, 0);
    b
}

pub fn header(tag: &[u8; 4], ticks: u64) -> Vec<u8> {
    let mut b = tag.to_vec();
    b.extend((ticks as u32).to_le_bytes());
    b.extend(((ticks >> 32) as u32).to_le_bytes());
    b
}

pub fn frame(tag: &[u8; 4], ticks: u64, payload: &[u8]) -> Vec<u8> {
    let mut body = header(tag, ticks);
    body.extend_from_slice(payload);
    encode_frame(&body).unwrap()
}

fn floats(b: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        b.extend(v.to_le_bytes());
    }
}

#[derive(Debug, Clone)]
pub struct Transducer {
    pub channel_id: String,
    pub frequency: f32,
    pub gain: f32,
    pub equivalent_beam_angle: f32,
    pub angle_sensitivity: f32,
    pub angle_offset: f32,
    pub pulse_lengths: [f32; 5],
    pub sa_corrections: [f32; 5],
}

impl Transducer {
    pub fn new(frequency: f32) -> Self {
        Transducer {
            channel_id: format!("GPT {} kHz 00907205a6d0 1 ES38B", frequency / 1000.0),
            frequency,
            gain: 25.92,
            equivalent_beam_angle: -20.7,
            angle_sensitivity: 21.9,
            angle_offset: 0.0,
            pulse_lengths: [0.000256, 0.000512, 0.001024, 0.002048, 0.004096],
            sa_corrections: [-0.7, -0.6, -0.49, -0.4, -0.3],
        }
    }
}

pub fn configuration(ticks: u64, survey: &str, transducers: &[Transducer]) -> Vec<u8> {
    let mut b = fixed(survey, 128);
    b.extend(fixed("transect", 128));
    b.extend(fixed("ER60", 128));
    b.extend(fixed("2.4.3", 30));
    b.extend([0u8; 98]);
    b.extend((transducers.len() as i32).to_le_bytes());
    for t in transducers {
        b.extend(fixed(&t.channel_id, 128));
        b.extend(1i32.to_le_bytes());
        floats(
            &mut b,
            &[
                t.frequency,
                t.gain,
                t.equivalent_beam_angle,
                7.1,
                7.0,
                t.angle_sensitivity,
                t.angle_sensitivity,
                t.angle_offset,
                t.angle_offset,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
            ],
        );
        floats(&mut b, &t.pulse_lengths);
        b.extend([0u8; 8]);
        floats(&mut b, &[t.gain; 5]);
        b.extend([0u8; 8]);
        floats(&mut b, &t.sa_corrections);
        b.extend([0u8; 8]);
        b.extend(fixed("050", 16));
        b.extend([0u8; 28]);
    }
    frame(b"CON0", ticks, &b)
}

#[derive(Debug, Clone)]
pub struct Sample0 {
    pub channel: i16,
    pub frequency: f32,
    pub transmit_power: f32,
    pub pulse_length: f32,
    pub sample_interval: f32,
    pub sound_velocity: f32,
    pub absorption_coefficient: f32,
    pub power: Vec<i16>,
    pub angle: Option<Vec<i16>>,
}

impl Sample0 {
    pub fn new(channel: i16, frequency: f32, samples: usize) -> Self {
        Sample0 {
            channel,
            frequency,
            transmit_power: 1000.0,
            pulse_length: 0.001024,
            sample_interval: 0.000256,
            sound_velocity: 1448.2969,
            absorption_coefficient: 0.009841439,
            power: (0..samples).map(|i| (i as i16) * 100).collect(),
            angle: Some((0..samples).map(|i| i as i16).collect()),
        }
    }
}

pub fn sample0(ticks: u64, s: &Sample0) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend(s.channel.to_le_bytes());
    b.extend(if s.angle.is_some() { 3i16 } else { 1i16 }.to_le_bytes());
    floats(
        &mut b,
        &[
            5.0,
            s.frequency,
            s.transmit_power,
            s.pulse_length,
            2425.15,
            s.sample_interval,
            s.sound_velocity,
            s.absorption_coefficient,
            0.0,
            0.0,
            0.0,
            10.0,
        ],
    );
    b.extend([0u8; 4]);
    floats(&mut b, &[0.0, 0.0]);
    b.extend(0i32.to_le_bytes());
    b.extend((s.power.len() as i32).to_le_bytes());
    for p in &s.power {
        b.extend(p.to_le_bytes());
    }
    if let Some(angle) = &s.angle {
        for a in angle {
            b.extend(a.to_le_bytes());
        }
    }
    frame(b"RAW0", ticks, &b)
}

pub fn sample3(ticks: u64, datatype: i16, count: i32, payload: &[u8]) -> Vec<u8> {
    let mut b = fixed("WBT 545612-15 ES200-7C", 128);
    b.extend(datatype.to_le_bytes());
    b.extend([0u8; 2]);
    b.extend(0i32.to_le_bytes());
    b.extend(count.to_le_bytes());
    b.extend_from_slice(payload);
    frame(b"RAW3", ticks, &b)
}

pub fn motion(ticks: u64, values: [f32; 4]) -> Vec<u8> {
    let mut b = Vec::new();
    floats(&mut b, &values);
    frame(b"MRU0", ticks, &b)
}

pub fn text(tag: &[u8; 4], ticks: u64, s: &str) -> Vec<u8> {
    let mut b = s.as_bytes().to_vec();
    b.push(0);
    frame(tag, ticks, &b)
}

/// A CON0 datagram with four transducers followed by `pings` pings on
/// each of them, one second apart
pub fn survey(pings: usize, samples: usize) -> Vec<u8> {
    let freqs = [18000.0, 38000.0, 120000.0, 200000.0];
    let transducers = freqs.iter().map(|&f| Transducer::new(f)).collect::<Vec<_>>();
    let mut out = configuration(T0, "JR16003_", &transducers);
    for p in 0..pings {
        let t = T0 + (p as u64 + 1) * SECOND;
        out.extend(text(b"NME0", t, "$GPGLL,5204.48,S,05834.10,W,120001.00,A*1A"));
        for (i, &f) in freqs.iter().enumerate() {
            out.extend(sample0(t, &Sample0::new(i as i16 + 1, f, samples)));
        }
    }
    out
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
