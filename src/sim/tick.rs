//! Fixed timestep round driver
//!
//! One function advances the machine: it gates input on the phase, walks
//! timed phases in order and runs each phase's exit action. Coin movements go
//! through the [`Wallet`] seam so the simulation never touches storage.

use super::input::{HeldKeys, apply_movement};
use super::outcome::{RandomSource, roll};
use super::state::{GameEvent, MachineState, RoundPhase};
use crate::consts::COIN_COST;
use crate::error::LedgerError;
use crate::events::Notification;
use crate::{ease_out, lerp};

/// Coin balance the driver debits and credits
pub trait Wallet {
    fn balance(&self) -> u32;
    fn debit(&mut self, n: u32) -> Result<u32, LedgerError>;
    fn credit(&mut self, n: u32) -> Result<u32, LedgerError>;
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional keys currently held
    pub keys: HeldKeys,
    /// Trigger pressed since the last tick (one-shot)
    pub trigger: bool,
}

/// Advance the machine by one timestep
pub fn tick(
    state: &mut MachineState,
    input: &TickInput,
    dt: f32,
    wallet: &mut dyn Wallet,
    source: &mut dyn RandomSource,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if state.is_idle() {
        if input.trigger && start_round(state, wallet, &mut events) {
            return events;
        }
        if let Some(next) = apply_movement(state.claw, input.keys, state.speed, state.bounds) {
            state.claw = next;
        }
        return events;
    }

    // Round in flight: movement and trigger are ignored
    advance(state, dt, wallet, source, &mut events);
    events
}

/// Debit a coin and enter CoinFlight. Returns false if the round didn't start.
fn start_round(
    state: &mut MachineState,
    wallet: &mut dyn Wallet,
    events: &mut Vec<GameEvent>,
) -> bool {
    let balance = wallet.balance();
    if balance < COIN_COST {
        log::info!("Trigger ignored: {} coins", balance);
        events.push(GameEvent::Notify(Notification::InsufficientFunds { balance }));
        return false;
    }

    match wallet.debit(COIN_COST) {
        Ok(_) => {}
        Err(LedgerError::InsufficientFunds { balance, .. }) => {
            events.push(GameEvent::Notify(Notification::InsufficientFunds { balance }));
            return false;
        }
        // Balance is already debited in memory; play on
        Err(LedgerError::Persistence { .. }) => {
            events.push(GameEvent::Notify(Notification::StoreFailure));
        }
    }

    state.holding = false;
    state.outcome = None;
    state.phase_elapsed = 0.0;
    enter(state, RoundPhase::CoinFlight, events);
    true
}

fn enter(state: &mut MachineState, to: RoundPhase, events: &mut Vec<GameEvent>) {
    log::debug!("Phase {:?} -> {:?}", state.phase, to);
    events.push(GameEvent::PhaseChanged {
        from: state.phase,
        to,
    });
    state.phase = to;
}

/// Run timed phases forward by `dt`, possibly crossing several boundaries
fn advance(
    state: &mut MachineState,
    dt: f32,
    wallet: &mut dyn Wallet,
    source: &mut dyn RandomSource,
    events: &mut Vec<GameEvent>,
) {
    state.phase_elapsed += dt.max(0.0);

    loop {
        let Some(duration) = state.schedule.duration(state.phase) else {
            state.phase_elapsed = 0.0;
            break;
        };
        let t = if duration > 0.0 {
            (state.phase_elapsed / duration).min(1.0)
        } else {
            1.0
        };

        match state.phase {
            RoundPhase::Lowering => {
                if state.outcome.is_none() && state.phase_elapsed >= duration * 0.5 {
                    draw_outcome(state, source, events);
                }
                state.claw.y = lerp(state.rest_height, state.grab_height, ease_out(t));
            }
            RoundPhase::Rising => {
                state.claw.y = lerp(state.grab_height, state.rest_height, ease_out(t));
            }
            _ => {}
        }

        if state.phase_elapsed < duration {
            break;
        }
        state.phase_elapsed -= duration;
        exit_phase(state, wallet, source, events);
    }
}

fn draw_outcome(
    state: &mut MachineState,
    source: &mut dyn RandomSource,
    events: &mut Vec<GameEvent>,
) {
    let outcome = roll(source);
    log::debug!("Outcome drawn: {:?}", outcome);
    state.outcome = Some(outcome);
    state.holding = outcome.is_win();
    events.push(GameEvent::OutcomeDrawn(outcome));
}

/// Exit action of the current phase, then transition
fn exit_phase(
    state: &mut MachineState,
    wallet: &mut dyn Wallet,
    source: &mut dyn RandomSource,
    events: &mut Vec<GameEvent>,
) {
    match state.phase {
        RoundPhase::Idle => return,
        RoundPhase::CoinFlight => {}
        RoundPhase::Lowering => {
            if state.outcome.is_none() {
                draw_outcome(state, source, events);
            }
            state.claw.y = state.grab_height;
        }
        RoundPhase::Rising => {
            state.claw.y = state.rest_height;
        }
        RoundPhase::Resolved => {
            resolve(state, wallet, source, events);
            state.phase_elapsed = 0.0;
        }
    }
    let next = state.phase.next();
    enter(state, next, events);
}

/// Credit the reward and report the result
fn resolve(
    state: &mut MachineState,
    wallet: &mut dyn Wallet,
    source: &mut dyn RandomSource,
    events: &mut Vec<GameEvent>,
) {
    let outcome = match state.outcome {
        Some(outcome) => outcome,
        None => {
            draw_outcome(state, source, events);
            state.outcome.unwrap_or(super::Outcome::Fail)
        }
    };
    let reward = outcome.reward();

    let (balance, store_failed) = match wallet.credit(reward) {
        Ok(balance) => (balance, false),
        Err(LedgerError::Persistence { balance, .. }) => (balance, true),
        Err(e) => {
            log::warn!("Credit of {} rejected: {}", reward, e);
            (wallet.balance(), false)
        }
    };

    state.rounds_played += 1;
    log::info!(
        "Round {} resolved: {:?} (+{}), balance {}",
        state.rounds_played,
        outcome,
        reward,
        balance
    );

    events.push(GameEvent::Notify(Notification::RoundResult {
        outcome,
        reward,
        balance,
    }));
    if store_failed {
        events.push(GameEvent::Notify(Notification::StoreFailure));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::consts::SIM_DT;
    use crate::ledger::CoinLedger;
    use crate::persistence::{AccountStore, MemoryStore};
    use crate::session::Session;
    use crate::sim::input::Direction;
    use crate::sim::outcome::{Outcome, ScriptedSource, SeededSource};
    use crate::tuning::Tuning;

    /// Plain balance without persistence
    struct Purse(u32);

    impl Wallet for Purse {
        fn balance(&self) -> u32 {
            self.0
        }
        fn debit(&mut self, n: u32) -> Result<u32, LedgerError> {
            if self.0 < n {
                return Err(LedgerError::InsufficientFunds {
                    balance: self.0,
                    required: n,
                });
            }
            self.0 -= n;
            Ok(self.0)
        }
        fn credit(&mut self, n: u32) -> Result<u32, LedgerError> {
            self.0 += n;
            Ok(self.0)
        }
    }

    fn trigger() -> TickInput {
        TickInput {
            trigger: true,
            ..Default::default()
        }
    }

    /// Tick until the machine is idle again, collecting events
    fn run_to_idle(
        state: &mut MachineState,
        wallet: &mut dyn Wallet,
        source: &mut dyn RandomSource,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..10_000 {
            if state.is_idle() {
                break;
            }
            events.extend(tick(state, &TickInput::default(), SIM_DT, wallet, source));
        }
        assert!(state.is_idle(), "round never finished");
        events
    }

    fn phase_changes(events: &[GameEvent]) -> Vec<RoundPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_trigger_without_coins() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(0);
        let mut source = ScriptedSource::new(vec![0.5]);

        let events = tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);

        assert_eq!(
            events,
            vec![GameEvent::Notify(Notification::InsufficientFunds { balance: 0 })]
        );
        assert_eq!(state.phase, RoundPhase::Idle);
        assert_eq!(wallet.0, 0);
        assert_eq!(source.consumed(), 0);
    }

    #[test]
    fn test_trigger_ignored_mid_round() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(5);
        let mut source = ScriptedSource::new(vec![0.5]);

        tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
        assert_eq!(state.phase, RoundPhase::CoinFlight);
        assert_eq!(wallet.0, 4);

        for _ in 0..10 {
            let events = tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
            assert!(events.is_empty());
        }
        assert_eq!(state.phase, RoundPhase::CoinFlight);
        assert_eq!(wallet.0, 4);
    }

    #[test]
    fn test_movement_only_while_idle() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(5);
        let mut source = ScriptedSource::new(vec![0.5]);
        let mut keys = HeldKeys::default();
        keys.press(Direction::Right);
        let moving = TickInput {
            keys,
            trigger: false,
        };

        let start_x = state.claw.x;
        tick(&mut state, &moving, SIM_DT, &mut wallet, &mut source);
        assert!(state.claw.x > start_x);

        tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
        let frozen = state.claw;
        for _ in 0..30 {
            tick(&mut state, &moving, SIM_DT, &mut wallet, &mut source);
        }
        assert_eq!(state.claw.x, frozen.x);
        assert_eq!(state.claw.z, frozen.z);
    }

    #[test]
    fn test_big_win_scenario() {
        let tuning = Tuning::default();
        let mut state = MachineState::new(&tuning);
        let mut store = MemoryStore::new();
        let mut session = Session::new(Account::new("alice_01", "pw", 1, crate::account::now()));
        let mut source = ScriptedSource::new(vec![0.95]);

        let mut events = {
            let mut ledger = CoinLedger::new(&mut session, &mut store);
            tick(&mut state, &trigger(), SIM_DT, &mut ledger, &mut source)
        };
        assert_eq!(session.coins(), 0);
        assert_eq!(store.get("alice_01").unwrap().unwrap().coins, 0);

        {
            let mut ledger = CoinLedger::new(&mut session, &mut store);
            events.extend(run_to_idle(&mut state, &mut ledger, &mut source));
        }

        assert_eq!(
            phase_changes(&events),
            vec![
                RoundPhase::CoinFlight,
                RoundPhase::Lowering,
                RoundPhase::Rising,
                RoundPhase::Resolved,
                RoundPhase::Idle,
            ]
        );
        assert!(events.contains(&GameEvent::OutcomeDrawn(Outcome::BigWin)));
        assert!(events.contains(&GameEvent::Notify(Notification::RoundResult {
            outcome: Outcome::BigWin,
            reward: 5,
            balance: 5,
        })));
        assert_eq!(session.coins(), 5);
        assert_eq!(store.get("alice_01").unwrap().unwrap().coins, 5);
        assert_eq!(state.rounds_played, 1);
        assert!(state.holding);
        assert!((state.claw.y - tuning.rest_height).abs() < 1e-5);
    }

    #[test]
    fn test_outcome_drawn_at_lowering_midpoint() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(1);
        let mut source = ScriptedSource::new(vec![0.7]);

        tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
        while state.phase != RoundPhase::Lowering {
            tick(&mut state, &TickInput::default(), SIM_DT, &mut wallet, &mut source);
        }
        while state.phase_elapsed + SIM_DT < 1.0 - 1e-4 {
            tick(&mut state, &TickInput::default(), SIM_DT, &mut wallet, &mut source);
            assert!(state.outcome.is_none(), "drawn early at {}", state.phase_elapsed);
            assert!(!state.holding);
        }
        while state.phase == RoundPhase::Lowering && state.outcome.is_none() {
            tick(&mut state, &TickInput::default(), SIM_DT, &mut wallet, &mut source);
        }
        assert_eq!(state.phase, RoundPhase::Lowering);
        assert_eq!(state.outcome, Some(Outcome::SmallWin));
        assert!(state.holding);
        assert!(state.claw.y < state.rest_height);
    }

    #[test]
    fn test_claw_reaches_grab_height() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(1);
        let mut source = ScriptedSource::new(vec![0.1]);

        tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
        let mut lowest = state.claw.y;
        while !state.is_idle() {
            tick(&mut state, &TickInput::default(), SIM_DT, &mut wallet, &mut source);
            lowest = lowest.min(state.claw.y);
        }
        // Lowering ends exactly at grab height, but the same tick may carry into Rising
        assert!(lowest >= state.grab_height);
        assert!(lowest - state.grab_height < 0.02);
        assert!(!state.holding);
        assert_eq!(wallet.0, 0);
    }

    #[test]
    fn test_large_dt_runs_whole_round() {
        let mut state = MachineState::new(&Tuning::default());
        let mut wallet = Purse(3);
        let mut source = ScriptedSource::new(vec![0.4]);

        tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
        let events = tick(&mut state, &TickInput::default(), 60.0, &mut wallet, &mut source);

        assert_eq!(
            phase_changes(&events),
            vec![
                RoundPhase::Lowering,
                RoundPhase::Rising,
                RoundPhase::Resolved,
                RoundPhase::Idle,
            ]
        );
        assert!(state.is_idle());
        assert_eq!(state.phase_elapsed, 0.0);
        assert_eq!(wallet.0, 3);
    }

    #[test]
    fn test_store_failure_keeps_optimistic_credit() {
        let mut state = MachineState::new(&Tuning::default());
        let mut store = MemoryStore::new();
        let mut session = Session::new(Account::new("gina", "pw", 2, crate::account::now()));
        let mut source = ScriptedSource::new(vec![0.65]);

        {
            let mut ledger = CoinLedger::new(&mut session, &mut store);
            tick(&mut state, &trigger(), SIM_DT, &mut ledger, &mut source);
        }
        store.set_offline(true);
        let events = {
            let mut ledger = CoinLedger::new(&mut session, &mut store);
            run_to_idle(&mut state, &mut ledger, &mut source)
        };

        assert!(events.contains(&GameEvent::Notify(Notification::RoundResult {
            outcome: Outcome::SmallWin,
            reward: 2,
            balance: 3,
        })));
        assert!(events.contains(&GameEvent::Notify(Notification::StoreFailure)));
        assert_eq!(session.coins(), 3);
        store.set_offline(false);
        assert_eq!(store.get("gina").unwrap().unwrap().coins, 1);
    }

    #[test]
    fn test_play_until_broke_is_deterministic() {
        let play = |seed: u64| {
            let mut state = MachineState::new(&Tuning::default());
            let mut wallet = Purse(10);
            let mut source = SeededSource::new(seed);
            let mut history = Vec::new();
            while wallet.0 > 0 && history.len() < 200 {
                tick(&mut state, &trigger(), SIM_DT, &mut wallet, &mut source);
                run_to_idle(&mut state, &mut wallet, &mut source);
                history.push((state.outcome, wallet.0));
            }
            history
        };
        assert_eq!(play(2024), play(2024));
    }
}
