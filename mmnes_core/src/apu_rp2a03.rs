use std::f32::consts::PI;
use log::{debug, trace};
use crate::apu::CPU_CLOCK_HZ;

const DUTY_CYCLES: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0,
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

const NOISE_PERIODS: [u16; 16] = [4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068];

const LENGTH_COUNTER_LOOKUP_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14,
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30
];

/// Frame counter events, in APU cycles (one APU cycle = two CPU cycles).
const FRAME_COUNTER_4_STEPS_EVENTS: [u32; 4] = [3728, 7456, 11185, 14914];
const FRAME_COUNTER_5_STEPS_EVENTS: [u32; 5] = [3728, 7456, 11185, 14914, 18640];

/***
 * quarter_frame, half_frame, interrupt flag
 */
const FRAME_COUNTER_4_STEPS_SEQUENCES: [(bool, bool, bool); 4] = [
    (true, false, false),
    (true, true, false),
    (true, false, false),
    (true, true, true),
];

const FRAME_COUNTER_5_STEPS_SEQUENCES: [(bool, bool, bool); 5] = [
    (true, false, false),
    (true, true, false),
    (true, false, false),
    (false, false, false),
    (true, true, false),
];

const HIGH_PASS_CUTOFF_HZ: f32 = 90.0;

trait Tick {
    fn tick(&mut self);
}

trait Channel {
    fn output(&self) -> u8;
}

#[derive(Debug, Default)]
struct Envelope {
    start_flag: bool,
    loop_flag: bool,
    const_volume: bool,
    counter: u8,
    divider: u8,
    volume: u8,
}

impl Envelope {
    fn write(&mut self, value: u8) {
        self.loop_flag = value & 0x20 != 0;
        self.const_volume = value & 0x10 != 0;
        self.volume = value & 0x0F;
    }

    fn volume(&self) -> u8 {
        if self.const_volume { self.volume } else { self.counter }
    }
}

impl Tick for Envelope {
    fn tick(&mut self) {
        if self.start_flag {
            self.start_flag = false;
            self.counter = 15;
            self.divider = self.volume;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.volume;
            if self.counter > 0 {
                self.counter -= 1;
            } else if self.loop_flag {
                self.counter = 15;
            }
        }
    }
}

#[derive(Debug, Default)]
struct LengthCounter {
    enabled: bool,
    halt: bool,
    counter: u8,
}

impl LengthCounter {
    fn load(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_COUNTER_LOOKUP_TABLE[(index & 0x1F) as usize];
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    fn is_active(&self) -> bool {
        self.counter > 0
    }
}

impl Tick for LengthCounter {
    fn tick(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }
}

#[derive(Debug, Default)]
struct LinearCounter {
    period: u8,
    counter: u8,
    reload: bool,
    control: bool,
}

impl Tick for LinearCounter {
    fn tick(&mut self) {
        if self.reload {
            self.counter = self.period;
        } else if self.counter > 0 {
            self.counter -= 1;
        }

        if !self.control {
            self.reload = false;
        }
    }
}

#[derive(Debug, Default)]
struct Sweep {
    enabled: bool,
    period: u8,
    negate: bool,
    shift: u8,
    divider: u8,
    reload: bool,
}

impl Sweep {
    fn write(&mut self, value: u8) {
        self.enabled = value & 0x80 != 0;
        self.period = (value >> 4) & 0x07;
        self.negate = value & 0x08 != 0;
        self.shift = value & 0x07;
        self.reload = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PulseChannel {
    One,
    Two,
}

#[derive(Debug)]
struct Pulse {
    channel: PulseChannel,
    duty_cycle: usize,
    duty_cycle_index: usize,
    timer_period: u16,
    timer_counter: u16,
    envelope: Envelope,
    length: LengthCounter,
    sweep: Sweep,
}

impl Pulse {
    fn new(channel: PulseChannel) -> Self {
        Pulse {
            channel,
            duty_cycle: 0,
            duty_cycle_index: 0,
            timer_period: 0,
            timer_counter: 0,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            sweep: Sweep::default(),
        }
    }

    fn write_control(&mut self, value: u8) {
        self.duty_cycle = (value >> 6) as usize;
        self.length.halt = value & 0x20 != 0;
        self.envelope.write(value);
    }

    fn write_timer_low(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x0700) | value as u16;
    }

    fn write_timer_high(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (((value & 0x07) as u16) << 8);
        self.length.load(value >> 3);
        self.duty_cycle_index = 0;
        self.envelope.start_flag = true;
    }

    /// Pulse 1 negates with ones' complement, pulse 2 with two's complement.
    fn target_period(&self) -> u16 {
        let change = self.timer_period >> self.sweep.shift;
        if self.sweep.negate {
            let extra = if self.channel == PulseChannel::One { 1 } else { 0 };
            self.timer_period.saturating_sub(change + extra)
        } else {
            self.timer_period + change
        }
    }

    fn is_muted(&self) -> bool {
        self.timer_period < 8 || self.target_period() > 0x07FF
    }

    fn tick_sweep(&mut self) {
        if self.sweep.divider == 0 && self.sweep.enabled && self.sweep.shift > 0 && !self.is_muted() {
            self.timer_period = self.target_period();
        }

        if self.sweep.divider == 0 || self.sweep.reload {
            self.sweep.divider = self.sweep.period;
            self.sweep.reload = false;
        } else {
            self.sweep.divider -= 1;
        }
    }
}

impl Tick for Pulse {
    fn tick(&mut self) {
        if self.timer_counter == 0 {
            self.timer_counter = self.timer_period;
            self.duty_cycle_index = (self.duty_cycle_index + 1) % 8;
        } else {
            self.timer_counter -= 1;
        }
    }
}

impl Channel for Pulse {
    fn output(&self) -> u8 {
        if !self.length.is_active() || self.is_muted() || DUTY_CYCLES[self.duty_cycle][self.duty_cycle_index] == 0 {
            0
        } else {
            self.envelope.volume()
        }
    }
}

#[derive(Debug, Default)]
struct Triangle {
    timer_period: u16,
    timer_counter: u16,
    sequence_index: usize,
    length: LengthCounter,
    linear: LinearCounter,
}

impl Triangle {
    fn write_linear_counter(&mut self, value: u8) {
        self.linear.control = value & 0x80 != 0;
        self.length.halt = self.linear.control;
        self.linear.period = value & 0x7F;
    }

    fn write_timer_low(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x0700) | value as u16;
    }

    fn write_timer_high(&mut self, value: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (((value & 0x07) as u16) << 8);
        self.length.load(value >> 3);
        self.linear.reload = true;
    }
}

impl Tick for Triangle {
    fn tick(&mut self) {
        if self.timer_counter == 0 {
            self.timer_counter = self.timer_period;
            if self.length.is_active() && self.linear.counter > 0 {
                self.sequence_index = (self.sequence_index + 1) % TRIANGLE_SEQUENCE.len();
            }
        } else {
            self.timer_counter -= 1;
        }
    }
}

impl Channel for Triangle {
    fn output(&self) -> u8 {
        if !self.length.is_active() || self.linear.counter == 0 {
            0
        } else {
            TRIANGLE_SEQUENCE[self.sequence_index]
        }
    }
}

#[derive(Debug)]
struct Noise {
    short_mode: bool,
    timer_period: u16,
    timer_counter: u16,
    shift_register: u16,
    envelope: Envelope,
    length: LengthCounter,
}

impl Noise {
    fn new() -> Self {
        Noise {
            short_mode: false,
            timer_period: NOISE_PERIODS[0],
            timer_counter: 0,
            shift_register: 1,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
        }
    }

    fn write_control(&mut self, value: u8) {
        self.length.halt = value & 0x20 != 0;
        self.envelope.write(value);
    }

    fn write_period(&mut self, value: u8) {
        self.short_mode = value & 0x80 != 0;
        self.timer_period = NOISE_PERIODS[(value & 0x0F) as usize];
    }

    fn write_length(&mut self, value: u8) {
        self.length.load(value >> 3);
        self.envelope.start_flag = true;
    }
}

impl Tick for Noise {
    fn tick(&mut self) {
        if self.timer_counter == 0 {
            self.timer_counter = self.timer_period - 1;
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.shift_register & 0x01) ^ ((self.shift_register >> tap) & 0x01);
            self.shift_register = (self.shift_register >> 1) | (feedback << 14);
        } else {
            self.timer_counter -= 1;
        }
    }
}

impl Channel for Noise {
    fn output(&self) -> u8 {
        if self.shift_register & 0x01 == 1 || !self.length.is_active() {
            0
        } else {
            self.envelope.volume()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameCounterMode {
    FourStep,
    FiveStep
}

#[derive(Debug)]
struct FrameCounter {
    mode: FrameCounterMode,
    inhibit_irq: bool,
    irq_flag: bool,
    apu_cycle: u32,
    next_step: usize,
}

impl FrameCounter {
    fn new() -> Self {
        FrameCounter {
            mode: FrameCounterMode::FourStep,
            inhibit_irq: false,
            irq_flag: false,
            apu_cycle: 0,
            next_step: 0,
        }
    }

    fn frame_tables(&self) -> (&'static [u32], &'static [(bool, bool, bool)]) {
        match self.mode {
            FrameCounterMode::FourStep => (&FRAME_COUNTER_4_STEPS_EVENTS, &FRAME_COUNTER_4_STEPS_SEQUENCES),
            FrameCounterMode::FiveStep => (&FRAME_COUNTER_5_STEPS_EVENTS, &FRAME_COUNTER_5_STEPS_SEQUENCES),
        }
    }

    /// Advance one APU cycle, returning the (quarter, half) frame clocks that fire on it.
    fn advance(&mut self) -> (bool, bool) {
        self.apu_cycle += 1;
        let (events, sequences) = self.frame_tables();

        if self.apu_cycle != events[self.next_step] {
            return (false, false);
        }

        let (quarter, half, irq) = sequences[self.next_step];
        if irq && !self.inhibit_irq {
            trace!("APU: frame counter interrupt");
            self.irq_flag = true;
        }

        self.next_step += 1;
        if self.next_step == events.len() {
            self.next_step = 0;
            self.apu_cycle = 0;
        }

        (quarter, half)
    }
}

/// First-order high-pass removing the DC offset of the mixer output.
#[derive(Debug)]
struct HighPassFilter {
    alpha: f32,
    previous_input: f32,
    previous_output: f32,
}

impl HighPassFilter {
    fn new(sample_rate: u32, cutoff: f32) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / sample_rate.max(1) as f32;

        HighPassFilter {
            alpha: rc / (rc + dt),
            previous_input: 0.0,
            previous_output: 0.0,
        }
    }

    fn apply(&mut self, input: f32) -> f32 {
        let output = self.alpha * (self.previous_output + input - self.previous_input);
        self.previous_input = input;
        self.previous_output = output;
        output
    }
}

/// The 2A03 sound unit, clocked once per CPU cycle and resampled to `sample_rate` by cycle accumulation.
#[derive(Debug)]
pub struct ApuRp2A03 {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc_output_level: u8,
    frame_counter: FrameCounter,
    odd_cycle: bool,
    sample_rate: u32,
    sample_accumulator: u32,
    filter: HighPassFilter,
}

impl ApuRp2A03 {
    pub fn new(sample_rate: u32) -> Self {
        debug!("APU: sample rate {} Hz", sample_rate);

        ApuRp2A03 {
            pulse1: Pulse::new(PulseChannel::One),
            pulse2: Pulse::new(PulseChannel::Two),
            triangle: Triangle::default(),
            noise: Noise::new(),
            dmc_output_level: 0,
            frame_counter: FrameCounter::new(),
            odd_cycle: false,
            sample_rate,
            sample_accumulator: 0,
            filter: HighPassFilter::new(sample_rate, HIGH_PASS_CUTOFF_HZ),
        }
    }

    pub fn reset(&mut self) {
        *self = ApuRp2A03::new(self.sample_rate);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn irq_asserted(&self) -> bool {
        self.frame_counter.irq_flag
    }

    /// Advance one CPU cycle; yields a sample whenever the output clock ticks.
    pub fn clock(&mut self) -> Option<f32> {
        self.triangle.tick();
        self.noise.tick();

        if self.odd_cycle {
            self.pulse1.tick();
            self.pulse2.tick();

            let (quarter, half) = self.frame_counter.advance();
            if quarter {
                self.quarter_frame();
            }
            if half {
                self.half_frame();
            }
        }
        self.odd_cycle = !self.odd_cycle;

        self.sample_accumulator += self.sample_rate;
        if self.sample_accumulator >= CPU_CLOCK_HZ {
            self.sample_accumulator -= CPU_CLOCK_HZ;
            let mixed = self.mix();
            Some(self.filter.apply(mixed))
        } else {
            None
        }
    }

    fn quarter_frame(&mut self) {
        self.pulse1.envelope.tick();
        self.pulse2.envelope.tick();
        self.noise.envelope.tick();
        self.triangle.linear.tick();
    }

    fn half_frame(&mut self) {
        self.pulse1.length.tick();
        self.pulse2.length.tick();
        self.triangle.length.tick();
        self.noise.length.tick();
        self.pulse1.tick_sweep();
        self.pulse2.tick_sweep();
    }

    fn mix(&self) -> f32 {
        let pulse = (self.pulse1.output() + self.pulse2.output()) as f32;
        let pulse_out = if pulse == 0.0 { 0.0 } else { 95.88 / (8128.0 / pulse + 100.0) };

        let tnd = self.triangle.output() as f32 / 8227.0
            + self.noise.output() as f32 / 12241.0
            + self.dmc_output_level as f32 / 22638.0;
        let tnd_out = if tnd == 0.0 { 0.0 } else { 159.79 / (1.0 / tnd + 100.0) };

        pulse_out + tnd_out
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(value),
            0x4001 => self.pulse1.sweep.write(value),
            0x4002 => self.pulse1.write_timer_low(value),
            0x4003 => self.pulse1.write_timer_high(value),
            0x4004 => self.pulse2.write_control(value),
            0x4005 => self.pulse2.sweep.write(value),
            0x4006 => self.pulse2.write_timer_low(value),
            0x4007 => self.pulse2.write_timer_high(value),
            0x4008 => self.triangle.write_linear_counter(value),
            0x400A => self.triangle.write_timer_low(value),
            0x400B => self.triangle.write_timer_high(value),
            0x400C => self.noise.write_control(value),
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),
            0x4011 => self.dmc_output_level = value & 0x7F,
            0x4015 => self.write_status(value),
            0x4017 => self.write_frame_counter(value),
            _ => trace!("APU: ignoring write 0x{:02X} to 0x{:04X}", value, addr),
        }
    }

    fn write_status(&mut self, value: u8) {
        self.pulse1.length.set_enabled(value & 0x01 != 0);
        self.pulse2.length.set_enabled(value & 0x02 != 0);
        self.triangle.length.set_enabled(value & 0x04 != 0);
        self.noise.length.set_enabled(value & 0x08 != 0);
    }

    fn write_frame_counter(&mut self, value: u8) {
        self.frame_counter.mode = if value & 0x80 != 0 { FrameCounterMode::FiveStep } else { FrameCounterMode::FourStep };
        self.frame_counter.inhibit_irq = value & 0x40 != 0;
        if self.frame_counter.inhibit_irq {
            self.frame_counter.irq_flag = false;
        }
        self.frame_counter.apu_cycle = 0;
        self.frame_counter.next_step = 0;

        if self.frame_counter.mode == FrameCounterMode::FiveStep {
            self.quarter_frame();
            self.half_frame();
        }
    }

    /// $4015 read; acknowledges the frame interrupt.
    pub fn read_status(&mut self) -> u8 {
        let value = self.peek_status();
        self.frame_counter.irq_flag = false;
        value
    }

    pub fn peek_status(&self) -> u8 {
        let mut value = 0;
        if self.pulse1.length.is_active() { value |= 0x01; }
        if self.pulse2.length.is_active() { value |= 0x02; }
        if self.triangle.length.is_active() { value |= 0x04; }
        if self.noise.length.is_active() { value |= 0x08; }
        if self.frame_counter.irq_flag { value |= 0x40; }
        value
    }
}
