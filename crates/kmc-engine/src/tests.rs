//! Unit and scenario tests for kmc-engine.

use std::collections::VecDeque;

use kmc_core::{KmcRng, RandomSource, RunBudget, RunConfig, RunMode, SiteId, Vec3};
use kmc_graph::{SiteGraph, SiteGraphBuilder};

use crate::{Engine, EngineBuilder};

/// Replays a fixed list of draws, then continues with a seeded stream.
struct Scripted {
    draws:    VecDeque<f64>,
    fallback: KmcRng,
}

impl Scripted {
    fn new(draws: &[f64]) -> Self {
        Self { draws: draws.iter().copied().collect(), fallback: KmcRng::new(0) }
    }
}

impl RandomSource for Scripted {
    fn next_f64(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or_else(|| self.fallback.next_f64())
    }
}

fn fixed_steps(carriers: usize, seed: u64, steps: u64) -> RunConfig {
    RunConfig::new(carriers, seed, RunMode::FixedPopulation { budget: RunBudget::Steps(steps) })
}

/// Directed ring 0 → 1 → 2 → 0 on an equilateral triangle, rates 1.
fn ring3() -> SiteGraph {
    let mut b = SiteGraphBuilder::new();
    let s0 = b.add_site(Vec3::new(0.0, 0.0, 0.0), 0.0);
    let s1 = b.add_site(Vec3::new(1.0, 0.0, 0.0), 0.0);
    let s2 = b.add_site(Vec3::new(0.5, 0.75_f64.sqrt(), 0.0), 0.0);
    b.add_hop_between(s0, s1, 1.0);
    b.add_hop_between(s1, s2, 1.0);
    b.add_hop_between(s2, s0, 1.0);
    b.build().unwrap()
}

/// Periodic 1-D chain of `n` sites with symmetric nearest-neighbour hops.
fn chain(n: u32, rate: f64) -> SiteGraph {
    let mut b = SiteGraphBuilder::new();
    for i in 0..n {
        b.add_site(Vec3::new(i as f64, 0.0, 0.0), -0.01 * i as f64);
    }
    for i in 0..n {
        let j = (i + 1) % n;
        b.add_hop(SiteId(i), SiteId(j), rate, Vec3::new(1.0, 0.0, 0.0));
        b.add_hop(SiteId(j), SiteId(i), rate, Vec3::new(-1.0, 0.0, 0.0));
    }
    b.build().unwrap()
}

/// Fully connected graph of `n` sites, every hop at rate 1.
fn complete(n: u32, blocked: &[u32], start_kind: u32) -> SiteGraph {
    let mut b = SiteGraphBuilder::new();
    for i in 0..n {
        let kind = if i == start_kind { "start" } else { "other" };
        b.add_site_with(Vec3::new(i as f64, (i * i) as f64, 0.0), 0.0, kind, blocked.contains(&i));
    }
    for i in 0..n {
        for j in 0..n {
            if i != j {
                b.add_hop_between(SiteId(i), SiteId(j), 1.0);
            }
        }
    }
    b.build().unwrap()
}

fn engine(config: RunConfig, graph: SiteGraph) -> Engine {
    EngineBuilder::new(config, graph).build().unwrap()
}

// ── Selection state machine ───────────────────────────────────────────────────

#[cfg(test)]
mod selection {
    use super::*;
    use crate::{Selection, Selector, Stage};
    use kmc_carrier::CarrierStore;
    use kmc_core::CarrierKind;

    fn placed(graph: &SiteGraph, pattern: &str, n: usize) -> CarrierStore {
        let mut store = CarrierStore::new(graph, CarrierKind::Electron, pattern).unwrap();
        store.inject(n, graph, &mut KmcRng::new(0)).unwrap();
        store
    }

    #[test]
    fn occupied_destination_is_forbidden_then_retried() {
        // Carrier on 0; 1 and 2 blocked; 3 free.  Events of 0: →1, →2, →3.
        let g = complete(4, &[1, 2], 0);
        let store = placed(&g, "start", 1);
        let mut sel = Selector::new();
        let mut rng = Scripted::new(&[0.0]);

        match sel.choose_event(0, SiteId(0), &g, store.occupancy(), &mut rng) {
            Stage::RetryDestination => {}
            other => panic!("expected RetryDestination, got {other:?}"),
        }
        assert!(sel.forbidden().is_forbidden_destination(SiteId(1)));
        assert!(!sel.is_surrounded(&g, SiteId(0)));
    }

    #[test]
    fn surrounded_carrier_sends_back_to_level_one() {
        // Two carriers on a two-site graph: each one's only hop is occupied.
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        let c = b.add_site(Vec3::x(), 0.0);
        b.add_pair(a, c, 1.0, 1.0);
        let g = b.build().unwrap();
        let store = placed(&g, "*", 2);
        let site = store.carriers()[0].site;

        let mut sel = Selector::new();
        let stage = sel.choose_event(0, site, &g, store.occupancy(), &mut Scripted::new(&[0.3]));
        assert_eq!(stage, Stage::RetrySource);
        assert!(sel.forbidden().is_forbidden_node(site));
        assert_eq!(sel.forbidden().destination_count(), 1);
    }

    #[test]
    fn all_surrounded_is_idle() {
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        let c = b.add_site(Vec3::x(), 0.0);
        b.add_pair(a, c, 1.0, 1.0);
        let g = b.build().unwrap();
        let store = placed(&g, "*", 2);

        let mut sel = Selector::new();
        let s = sel.select(store.carriers(), &g, store.occupancy(), &mut KmcRng::new(3));
        assert_eq!(s, Selection::Idle);
        assert_eq!(sel.forbidden().node_count(), 2);
        assert!(sel.retries() <= 2 * g.site_count());
    }

    #[test]
    fn decay_is_committed_without_destination() {
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        b.add_decay(a, 1.0).unwrap();
        let g = b.build().unwrap();
        let store = placed(&g, "*", 1);
        let mut sel = Selector::new();
        let s = sel.select(store.carriers(), &g, store.occupancy(), &mut KmcRng::new(0));
        assert!(matches!(s, Selection::Decay { slot: 0, .. }));
    }

    #[test]
    fn zero_rate_events_never_selected() {
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        let c = b.add_site(Vec3::x(), 0.0);
        b.add_hop_between(a, c, 0.0);
        b.add_decay(a, 2.0).unwrap();
        let g = b.build().unwrap();
        let mut store = CarrierStore::new(&g, CarrierKind::Electron, "*").unwrap();
        store.inject(1, &g, &mut Scripted::new(&[0.0])).unwrap();
        assert_eq!(store.carriers()[0].site, a);

        let mut sel = Selector::new();
        for u in [0.0, 0.25, 0.5, 0.999] {
            let stage = sel.choose_event(0, a, &g, store.occupancy(), &mut Scripted::new(&[u]));
            assert!(matches!(stage, Stage::Commit(Selection::Decay { .. })), "u = {u}");
        }
    }
}

// ── Engine contract ───────────────────────────────────────────────────────────

#[cfg(test)]
mod engine_contract {
    use super::*;
    use crate::{EngineError, NoopObserver, StepOutcome};
    use kmc_carrier::CarrierError;

    #[test]
    fn zero_escape_rate_is_fatal() {
        let mut b = SiteGraphBuilder::new();
        b.add_site(Vec3::zeros(), 0.0);
        let mut e = engine(fixed_steps(1, 0, 10), b.build().unwrap());
        let err = e.step().unwrap_err();
        assert!(matches!(err, EngineError::ZeroEscapeRate { step: 0, carriers: 1 }));
        assert!(err.to_string().contains("escape rate is zero"));
    }

    #[test]
    fn too_many_carriers_is_fatal() {
        let err = EngineBuilder::new(fixed_steps(4, 0, 10), ring3()).build().err().unwrap();
        assert!(matches!(
            err,
            EngineError::Carrier(CarrierError::TooManyCarriers { requested: 4, available: 3 })
        ));
        assert!(err.to_string().contains("carrier count exceeds site count"));
    }

    #[test]
    fn invalid_config_rejected() {
        let err = EngineBuilder::new(fixed_steps(0, 0, 10), ring3()).build().err().unwrap();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn lifetime_mode_needs_decay_events() {
        let cfg = RunConfig::new(1, 0, RunMode::Lifetime { insertions: 5 });
        let err = EngineBuilder::new(cfg, ring3()).build().err().unwrap();
        assert!(matches!(err, EngineError::NoDecayEvents));
    }

    #[test]
    fn time_is_strictly_increasing() {
        let mut e = engine(fixed_steps(3, 9, 500), chain(10, 1.0e12));
        let mut last = e.clock();
        for _ in 0..500 {
            let r = e.step().unwrap();
            let now = e.clock();
            assert!(r.dt > 0.0);
            assert!(now.time > last.time);
            assert_eq!(now.step, last.step + 1);
            last = now;
        }
    }

    #[test]
    fn occupancy_invariant_holds_every_step() {
        let mut e = engine(fixed_steps(8, 4, 2_000), chain(12, 1.0));
        for _ in 0..2_000 {
            e.step().unwrap();
            assert!(e.invariant_violations().is_empty());
            assert!(e.check_invariants().is_ok());
        }
    }

    #[test]
    fn fixed_population_is_conserved() {
        let mut e = engine(fixed_steps(5, 1, 1_000), chain(8, 1.0));
        for _ in 0..1_000 {
            e.step().unwrap();
            assert_eq!(e.carriers().len(), 5);
        }
    }

    #[test]
    fn forbidden_retries_bounded_by_site_count() {
        // Dense packing forces frequent rejections.
        let g = complete(6, &[], 99);
        let sites = g.site_count();
        let mut e = engine(fixed_steps(5, 17, 3_000), g);
        let mut saw_retry = false;
        for _ in 0..3_000 {
            e.step().unwrap();
            assert!(e.last_retries() <= 2 * sites);
            saw_retry |= e.last_retries() > 0;
        }
        assert!(saw_retry);
    }

    #[test]
    fn jumps_accumulate_event_displacement() {
        let mut e = engine(fixed_steps(1, 2, 200), chain(50, 1.0));
        let mut expected = Vec3::zeros();
        for _ in 0..200 {
            if let StepOutcome::Jump { from, to, .. } = e.step().unwrap().outcome {
                let event = e.graph().events(from).find(|&ev| e.graph().destination(ev) == Some(to)).unwrap();
                expected += e.graph().displacement(event);
            }
        }
        assert_eq!(e.carriers()[0].displacement, expected);
    }

    #[test]
    fn identical_seeds_identical_runs() {
        let run = |seed| {
            let mut e = engine(fixed_steps(4, seed, 300), chain(10, 1.0));
            let outcomes: Vec<_> = (0..300).map(|_| e.step().unwrap()).collect();
            (outcomes, e.clock())
        };
        assert_eq!(run(5), run(5));
        assert_ne!(run(5).1, run(6).1);
    }

    #[test]
    fn run_stops_on_step_budget() {
        let mut e = engine(fixed_steps(2, 0, 750), chain(10, 1.0));
        let s = e.run(&mut NoopObserver).unwrap();
        assert_eq!(s.steps, 750);
        assert!(!s.time_limited);
        let p: f64 = s.occupation_probability.iter().sum();
        // Two carriers: occupation probabilities sum to the population.
        assert!((p - 2.0).abs() < 1e-9);
    }

    #[test]
    fn run_stops_on_time_budget() {
        let cfg = RunConfig::new(1, 0, RunMode::FixedPopulation { budget: RunBudget::Seconds(5.0) });
        let mut e = engine(cfg, chain(10, 1.0));
        let s = e.run(&mut NoopObserver).unwrap();
        assert!(s.time >= 5.0);
        assert!(s.steps > 0);
    }

    #[test]
    fn wall_clock_limit_keeps_partial_statistics() {
        let mut cfg = fixed_steps(1, 0, u64::MAX);
        cfg.max_realtime_secs = Some(0.02);
        let mut e = engine(cfg, chain(10, 1.0));
        for _ in 0..25 {
            e.step().unwrap();
        }
        let s = e.run(&mut NoopObserver).unwrap();
        assert!(s.time_limited);
        assert!(e.is_time_limited());
        assert!(s.steps >= 25);
        assert_eq!(s.steps, e.clock().step);
        assert!(s.time > 0.0);
        let p: f64 = s.occupation_probability.iter().sum();
        assert!((p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decay_in_fixed_mode_retires_carrier() {
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        let c = b.add_site(Vec3::x(), 0.0);
        b.add_decay(a, 1.0).unwrap();
        b.add_decay(c, 1.0).unwrap();
        let mut e = engine(fixed_steps(1, 0, 100), b.build().unwrap());
        let s = e.run(&mut NoopObserver).unwrap();
        assert_eq!(s.steps, 1);
        assert_eq!(s.insertions, 1);
        assert!(s.carriers.is_empty());
        assert!(s.decay.is_some());
        assert!(e.is_complete());
    }
}

// ── Lifetime mode ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifetime {
    use super::*;
    use crate::{NoopObserver, StepOutcome};
    use kmc_core::{CarrierId, EnergyTracking};

    fn chain_with_decay(n: u32, hop: f64, decay: f64) -> SiteGraph {
        let mut b = SiteGraphBuilder::new();
        for i in 0..n {
            b.add_site(Vec3::new(i as f64, 0.0, 0.0), 0.1 * i as f64);
        }
        for i in 1..n {
            b.add_pair(SiteId(i - 1), SiteId(i), hop, hop);
        }
        for i in 0..n {
            b.add_decay(SiteId(i), decay).unwrap();
        }
        b.build().unwrap()
    }

    #[test]
    fn reinjection_conserves_count_and_resets_state() {
        let cfg = RunConfig::new(3, 8, RunMode::Lifetime { insertions: 200 });
        let mut e = engine(cfg, chain_with_decay(12, 5.0, 1.0));
        let mut decays = 0;
        while !e.is_complete() {
            let report = e.step().unwrap();
            assert_eq!(e.carriers().len(), 3);
            if let StepOutcome::Decay { record, replacement } = report.outcome {
                let fresh_id = replacement.unwrap();
                assert_eq!(fresh_id, CarrierId(3 + decays));
                assert_eq!(record.insertion, decays);
                let fresh = e.carriers().iter().find(|c| c.id == fresh_id).unwrap();
                assert_eq!(fresh.lifetime, 0.0);
                assert_eq!(fresh.steps, 0);
                assert_eq!(fresh.displacement, Vec3::zeros());
                decays += 1;
            }
            assert!(e.invariant_violations().is_empty());
        }
        assert_eq!(e.insertions(), 200);
    }

    #[test]
    fn energy_tracker_follows_slot_zero() {
        #[derive(Default)]
        struct Samples(Vec<kmc_stats::EnergySample>);
        impl crate::KmcObserver for Samples {
            fn on_energy_sample(&mut self, s: &kmc_stats::EnergySample) {
                self.0.push(*s);
            }
        }

        let mut cfg = RunConfig::new(1, 4, RunMode::Lifetime { insertions: 30 });
        cfg.energy_tracking = Some(EnergyTracking { alpha: 0.3, every_steps: 5 });
        let mut e = engine(cfg, chain_with_decay(6, 3.0, 1.0));
        let mut obs = Samples::default();
        e.run(&mut obs).unwrap();

        assert!(!obs.0.is_empty());
        // Ids in the samples never go backwards.
        assert!(obs.0.windows(2).all(|w| w[0].carrier <= w[1].carrier));
        // Every new id restarts the average at a site energy (multiples of 0.1).
        for w in obs.0.windows(2) {
            if w[1].carrier != w[0].carrier {
                let scaled = w[1].average * 10.0;
                assert!((scaled - scaled.round()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn summary_reports_decay_statistics() {
        let cfg = RunConfig::new(2, 1, RunMode::Lifetime { insertions: 50 });
        let mut e = engine(cfg, chain_with_decay(8, 2.0, 1.0));
        let s = e.run(&mut NoopObserver).unwrap();
        assert_eq!(s.mode, "lifetime");
        assert_eq!(s.insertions, 50);
        let d = s.decay.unwrap();
        assert_eq!(d.decays, 50);
        assert!(d.mean_lifetime > 0.0);
        assert!(d.mean_free_path >= 0.0);
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;
    use crate::{NoopObserver, StepOutcome};

    /// Scenario A: one carrier on a 3-site ring for exactly 1000 steps.
    #[test]
    fn ring_visits_sites_uniformly() {
        let mut e = engine(fixed_steps(1, 21, 1_000), ring3());
        let s = e.run(&mut NoopObserver).unwrap();
        assert_eq!(s.steps, 1_000);
        for p in &s.occupation_probability {
            assert!((p - 1.0 / 3.0).abs() < 0.08, "occupation {p}");
        }
        // The ring closes on itself: net displacement is at most two hops.
        let d = Vec3::from(s.carriers[0].displacement);
        assert!(d.norm() <= 2.0 + 1e-9);
        assert_eq!(e.graph().occupation_probability, s.occupation_probability);
    }

    /// Scenario B: decay only, no hopping.  Mean lifetime converges to 1/λ.
    #[test]
    fn mean_lifetime_converges_to_inverse_decay_rate() {
        let lambda = 2.0;
        let mut b = SiteGraphBuilder::new();
        let a = b.add_site(Vec3::zeros(), 0.0);
        let c = b.add_site(Vec3::x(), 0.0);
        b.add_pair(a, c, 0.0, 0.0);
        b.add_decay(a, lambda).unwrap();
        b.add_decay(c, lambda).unwrap();

        let cfg = RunConfig::new(1, 12, RunMode::Lifetime { insertions: 20_000 });
        let mut e = engine(cfg, b.build().unwrap());
        let s = e.run(&mut NoopObserver).unwrap();
        let d = s.decay.unwrap();
        assert_eq!(d.decays, 20_000);
        assert!((d.mean_lifetime - 1.0 / lambda).abs() < 0.05 / lambda, "⟨τ⟩ = {}", d.mean_lifetime);
        assert_eq!(d.mean_free_path, 0.0);
    }

    /// Scenario C: only one free destination; the carrier must find it.
    #[test]
    fn boxed_in_carrier_commits_to_only_free_site() {
        // Sites 1 and 2 externally occupied, carrier starts on 0, 3 is free.
        // Draws: injection, dt, Level 1, then Level 2 hits 0→1 and 0→2 first.
        let g = complete(4, &[1, 2], 0);
        let mut cfg = fixed_steps(1, 0, 50);
        cfg.injection_pattern = "start".into();
        let mut e = EngineBuilder::new(cfg, g)
            .with_rng(Scripted::new(&[0.0, 0.5, 0.0, 0.1, 0.1, 0.9]))
            .build()
            .unwrap();

        let first = e.step().unwrap();
        assert_eq!(first.outcome, StepOutcome::Jump {
            carrier: kmc_core::CarrierId(0),
            from:    SiteId(0),
            to:      SiteId(3),
        });
        assert_eq!(e.last_retries(), 2);

        // From then on it can only shuttle between 0 and 3.
        for _ in 0..49 {
            match e.step().unwrap().outcome {
                StepOutcome::Jump { from, to, .. } => {
                    assert!(matches!((from.0, to.0), (0, 3) | (3, 0)));
                }
                other => panic!("unexpected outcome {other:?}"),
            }
            assert!(e.last_retries() <= 2 * 4);
        }
    }
}

// ── Observer and ensemble ─────────────────────────────────────────────────────

#[cfg(test)]
mod observing {
    use super::*;
    use crate::{run_ensemble, KmcObserver, StepOutcome};
    use kmc_carrier::Carrier;
    use kmc_core::{OutputCadence, SimClock};
    use kmc_stats::{RunSummary, TimeDependenceSample};

    #[derive(Default)]
    struct Counter {
        started:   usize,
        steps:     u64,
        snapshots: Vec<u64>,
        ended:     bool,
    }

    impl KmcObserver for Counter {
        fn on_run_start(&mut self, _clock: &SimClock, carriers: &[Carrier]) {
            self.started = carriers.len();
        }
        fn on_step_end(&mut self, _clock: &SimClock, _outcome: &StepOutcome) {
            self.steps += 1;
        }
        fn on_snapshot(&mut self, clock: &SimClock, _c: &[Carrier], _s: &TimeDependenceSample) {
            self.snapshots.push(clock.step);
        }
        fn on_run_end(&mut self, _summary: &RunSummary, _graph: &SiteGraph) {
            self.ended = true;
        }
    }

    #[test]
    fn hooks_fire_at_cadence() {
        let mut cfg = fixed_steps(2, 3, 100);
        cfg.output = OutputCadence::Steps(25);
        let mut e = engine(cfg, chain(6, 1.0));
        let mut obs = Counter::default();
        e.run(&mut obs).unwrap();
        assert_eq!(obs.started, 2);
        assert_eq!(obs.steps, 100);
        assert_eq!(obs.snapshots, [25, 50, 75, 100]);
        assert!(obs.ended);
    }

    #[test]
    fn ensemble_replicas_are_independent() {
        let cfg = fixed_steps(2, 7, 200);
        let g = chain(10, 1.0);
        let runs = run_ensemble(&cfg, &g, 3).unwrap();
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|s| s.steps == 200));
        assert_ne!(runs[0].time, runs[1].time);
        // The caller's graph is untouched.
        assert!(g.occupation_time.iter().all(|&t| t == 0.0));
        // Same replica index, same result.
        assert_eq!(run_ensemble(&cfg, &g, 1).unwrap()[0], runs[0]);
    }
}
