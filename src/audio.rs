//! Web Audio sound
//!
//! Every effect is a short list of oscillator tones with a decaying gain
//! envelope, and the music bed is a detuned triad drone. Nothing is loaded
//! from disk.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use crate::events::Notification;
use crate::session::MusicHandle;
use crate::sim::{GameEvent, Outcome, RoundPhase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Coin dropped into the slot
    CoinInsert,
    /// Claw starts descending
    ClawDrop,
    /// Claw closes at the bottom
    ClawGrab,
    /// Round ended with nothing
    Lose,
    /// Round paid out 1-2 coins
    Win,
    /// Round paid out the top prize
    BigWin,
    /// Trigger without enough coins
    Denied,
}

impl SoundEffect {
    /// Sound cue for a simulation event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PhaseChanged { to, .. } => match to {
                RoundPhase::CoinFlight => Some(SoundEffect::CoinInsert),
                RoundPhase::Lowering => Some(SoundEffect::ClawDrop),
                RoundPhase::Rising => Some(SoundEffect::ClawGrab),
                _ => None,
            },
            GameEvent::OutcomeDrawn(_) => None,
            GameEvent::Notify(Notification::InsufficientFunds { .. }) => Some(SoundEffect::Denied),
            GameEvent::Notify(Notification::RoundResult { outcome, .. }) => Some(match outcome {
                Outcome::Fail => SoundEffect::Lose,
                Outcome::BreakEven | Outcome::SmallWin => SoundEffect::Win,
                Outcome::BigWin => SoundEffect::BigWin,
            }),
            GameEvent::Notify(_) => None,
        }
    }
}

/// One oscillator note: pitch glide from `from_hz` to `to_hz` while the gain
/// decays from `peak` over `length` seconds, starting `delay` seconds from now
struct Tone {
    wave: OscillatorType,
    from_hz: f32,
    to_hz: f32,
    peak: f32,
    delay: f64,
    length: f64,
}

const fn note(wave: OscillatorType, hz: f32, peak: f32, delay: f64, length: f64) -> Tone {
    Tone {
        wave,
        from_hz: hz,
        to_hz: hz,
        peak,
        delay,
        length,
    }
}

const fn glide(wave: OscillatorType, from_hz: f32, to_hz: f32, peak: f32, length: f64) -> Tone {
    Tone {
        wave,
        from_hz,
        to_hz,
        peak,
        delay: 0.0,
        length,
    }
}

use OscillatorType::{Sawtooth, Sine, Square, Triangle};

static COIN: [Tone; 2] = [
    note(Square, 1318.5, 0.15, 0.0, 0.25),
    note(Square, 1975.5, 0.15, 0.07, 0.25),
];
static DROP: [Tone; 1] = [glide(Sawtooth, 220.0, 110.0, 0.12, 1.8)];
static GRAB: [Tone; 1] = [glide(Square, 180.0, 70.0, 0.3, 0.12)];
static LOSE: [Tone; 1] = [glide(Triangle, 392.0, 261.6, 0.3, 0.9)];
static WIN: [Tone; 3] = [
    note(Sine, 523.25, 0.3, 0.0, 0.35),
    note(Sine, 659.25, 0.3, 0.1, 0.35),
    note(Sine, 783.99, 0.3, 0.2, 0.35),
];
static BIG_WIN: [Tone; 5] = [
    note(Sine, 523.25, 0.3, 0.0, 0.35),
    note(Sine, 659.25, 0.3, 0.1, 0.35),
    note(Sine, 783.99, 0.3, 0.2, 0.35),
    note(Sine, 1046.5, 0.3, 0.3, 0.35),
    note(Sine, 1318.5, 0.3, 0.4, 0.5),
];
static DENIED: [Tone; 1] = [note(Square, 110.0, 0.2, 0.0, 0.3)];

impl SoundEffect {
    fn tones(self) -> &'static [Tone] {
        match self {
            SoundEffect::CoinInsert => &COIN,
            SoundEffect::ClawDrop => &DROP,
            SoundEffect::ClawGrab => &GRAB,
            SoundEffect::Lose => &LOSE,
            SoundEffect::Win => &WIN,
            SoundEffect::BigWin => &BIG_WIN,
            SoundEffect::Denied => &DENIED,
        }
    }
}

/// Music gain at full volume; the drone sits well under the effects
const MUSIC_LEVEL: f32 = 0.08;

/// Running music voice
struct MusicVoice {
    handle: MusicHandle,
    oscs: Vec<OscillatorNode>,
    gain: GainNode,
}

pub struct AudioManager {
    ctx: Option<AudioContext>,
    sfx_volume: f32,
    music: Option<MusicVoice>,
    next_handle: u32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = match AudioContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("No AudioContext, sound disabled: {:?}", e);
                None
            }
        };
        Self {
            ctx,
            sfx_volume: 0.8,
            music: None,
            next_handle: 1,
        }
    }

    /// Browsers keep the context suspended until a user gesture
    pub fn resume(&self) {
        if let Some(ctx) = self.ctx.as_ref().filter(|c| c.state() == AudioContextState::Suspended) {
            let _ = ctx.resume();
        }
    }

    /// Effects gain, already scaled by master volume and mute
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Start the music bed, replacing any running voice
    pub fn start_music(&mut self, vol: f32) -> Option<MusicHandle> {
        if let Some(voice) = self.music.take() {
            Self::stop_voice(voice);
        }
        let ctx = self.ctx.as_ref()?;
        let gain = ctx.create_gain().ok()?;
        gain.gain().set_value(vol.clamp(0.0, 1.0) * MUSIC_LEVEL);
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        let mut oscs = Vec::with_capacity(3);
        for (hz, cents) in [(261.63, 0.0), (329.63, 4.0), (392.0, -4.0)] {
            let osc = ctx.create_oscillator().ok()?;
            osc.set_type(Triangle);
            osc.frequency().set_value(hz);
            osc.detune().set_value(cents);
            osc.connect_with_audio_node(&gain).ok()?;
            osc.start().ok()?;
            oscs.push(osc);
        }

        let handle = MusicHandle(self.next_handle);
        self.next_handle += 1;
        self.music = Some(MusicVoice { handle, oscs, gain });
        log::info!("Music started ({:?})", handle);
        Some(handle)
    }

    /// Change the music volume without restarting it
    pub fn set_music_volume(&self, handle: MusicHandle, vol: f32) {
        if let Some(voice) = self.music.as_ref().filter(|v| v.handle == handle) {
            voice.gain.gain().set_value(vol.clamp(0.0, 1.0) * MUSIC_LEVEL);
        }
    }

    /// Stop the voice owned by `handle`; stale handles are ignored
    pub fn stop_music(&mut self, handle: MusicHandle) {
        if self.music.as_ref().is_some_and(|v| v.handle == handle) {
            if let Some(voice) = self.music.take() {
                Self::stop_voice(voice);
                log::info!("Music stopped ({:?})", handle);
            }
        }
    }

    fn stop_voice(voice: MusicVoice) {
        for osc in voice.oscs {
            let _ = osc.stop();
        }
        let _ = voice.gain.disconnect();
    }

    /// Play the cue for each event
    pub fn play_events(&self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }

    pub fn play(&self, effect: SoundEffect) {
        if self.sfx_volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        self.resume();

        let now = ctx.current_time();
        for tone in effect.tones() {
            if Self::schedule(ctx, tone, self.sfx_volume, now).is_none() {
                log::debug!("Dropped tone for {:?}", effect);
                return;
            }
        }
    }

    fn schedule(ctx: &AudioContext, tone: &Tone, vol: f32, now: f64) -> Option<()> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;
        osc.set_type(tone.wave);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        let start = now + tone.delay;
        let end = start + tone.length;

        let pitch = osc.frequency();
        pitch.set_value_at_time(tone.from_hz, start).ok()?;
        if tone.to_hz != tone.from_hz {
            pitch.exponential_ramp_to_value_at_time(tone.to_hz, end).ok()?;
        }

        // Silent until the tone's start, then exponential decay
        let level = gain.gain();
        level.set_value_at_time(0.0, now).ok()?;
        level.set_value_at_time(tone.peak * vol, start).ok()?;
        level.exponential_ramp_to_value_at_time(0.01, end).ok()?;

        osc.start_with_when(start).ok()?;
        osc.stop_with_when(end + 0.05).ok()?;
        Some(())
    }
}
