//! Domain routing of protocol signals.
//!
//! The active [`Domain`] decides which engine a [`Signal`] is delivered to.
//! Every engine speaks the same [`SignalProtocol`], so dispatch is a single
//! match on the domain. Reading is driven by sight patterns rather than ids
//! and goes through [`Substrate`](super::Substrate) instead.

use serde::{Deserialize, Serialize};

use crate::config::SequenceConfig;
use crate::error::{MnemoError, Result};
use crate::kernel::{Confirmation, Phase, SequenceAutomaton, SignalProtocol, SymbolId};
use crate::memory::{ArithmeticBlock, CountingNetwork, EpisodicMemory};

/// Which engine receives signals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Digit sequences with an operator; also memorized verbatim
    #[default]
    Addition,
    /// Learning the order of quantities
    Counting,
    /// Trigger sequences and their outcome
    Episodes,
}

/// One protocol signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Begin,
    Step(SymbolId),
    Confirm(SymbolId),
    Commit(SymbolId),
}

/// What a dispatched signal produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// BEGIN or STEP taken
    Accepted,
    Confirmed(Confirmation),
    /// Index of the stored entry, `None` when nothing was pending
    Committed(Option<usize>),
    /// Sum computed by an equal sign in the addition domain
    Sum(Vec<SymbolId>),
}

/// Owns one engine per domain and forwards signals to the active one.
#[derive(Clone, Debug)]
pub struct DomainRouter {
    domain: Domain,
    addition: SequenceAutomaton,
    counting: CountingNetwork,
    arithmetic: ArithmeticBlock,
    episodes: EpisodicMemory,
}

impl DomainRouter {
    pub fn new(config: &SequenceConfig) -> Self {
        Self::from_parts(
            SequenceAutomaton::from_config(config),
            CountingNetwork::new(),
            ArithmeticBlock::default(),
            EpisodicMemory::new(config.capacity),
        )
    }

    /// Assemble a router from engines restored elsewhere.
    pub fn from_parts(
        addition: SequenceAutomaton,
        counting: CountingNetwork,
        arithmetic: ArithmeticBlock,
        episodes: EpisodicMemory,
    ) -> Self {
        Self {
            domain: Domain::default(),
            addition,
            counting,
            arithmetic,
            episodes,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn set_domain(&mut self, domain: Domain) {
        if domain != self.domain {
            tracing::debug!(from = ?self.domain, to = ?domain, "domain switched");
            self.domain = domain;
        }
    }

    pub fn addition(&self) -> &SequenceAutomaton {
        &self.addition
    }

    pub fn counting(&self) -> &CountingNetwork {
        &self.counting
    }

    pub fn arithmetic(&self) -> &ArithmeticBlock {
        &self.arithmetic
    }

    pub fn arithmetic_mut(&mut self) -> &mut ArithmeticBlock {
        &mut self.arithmetic
    }

    pub fn episodes(&self) -> &EpisodicMemory {
        &self.episodes
    }

    pub fn episodes_mut(&mut self) -> &mut EpisodicMemory {
        &mut self.episodes
    }

    /// Deliver `signal` to the active domain.
    pub fn dispatch(&mut self, signal: Signal) -> Result<Response> {
        match self.domain {
            Domain::Counting => drive(&mut self.counting, signal),
            Domain::Episodes => drive(&mut self.episodes, signal),
            Domain::Addition => self.dispatch_addition(signal),
        }
    }

    /// Steps feed both the rote memory of the expression and the arithmetic
    /// block; the equal sign yields the computed sum. A step the arithmetic
    /// block rejects is not memorized either.
    fn dispatch_addition(&mut self, signal: Signal) -> Result<Response> {
        match signal {
            Signal::Begin => {
                self.arithmetic.begin();
                self.addition.begin()?;
                Ok(Response::Accepted)
            }
            Signal::Step(symbol) => {
                if self.addition.phase() != Phase::Stepping {
                    return Err(MnemoError::Protocol(format!(
                        "STEP received in phase {:?}; BEGIN first",
                        self.addition.phase()
                    )));
                }
                let sum = self
                    .arithmetic
                    .feed(symbol, &self.counting)?
                    .map(<[SymbolId]>::to_vec);
                self.addition.step(symbol)?;
                Ok(sum.map_or(Response::Accepted, Response::Sum))
            }
            other => drive(&mut self.addition, other),
        }
    }
}

impl Default for DomainRouter {
    fn default() -> Self {
        Self::new(&SequenceConfig::default())
    }
}

fn drive<P>(engine: &mut P, signal: Signal) -> Result<Response>
where
    P: SignalProtocol<Symbol = SymbolId, Tail = SymbolId>,
{
    Ok(match signal {
        Signal::Begin => {
            engine.begin()?;
            Response::Accepted
        }
        Signal::Step(symbol) => {
            engine.step(symbol)?;
            Response::Accepted
        }
        Signal::Confirm(symbol) => Response::Confirmed(engine.confirm(symbol)?),
        Signal::Commit(tail) => Response::Committed(engine.commit(tail)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ArithmeticSymbols;

    fn send(router: &mut DomainRouter, signals: &[Signal]) -> Vec<Response> {
        signals.iter().map(|&s| router.dispatch(s).unwrap()).collect()
    }

    #[test]
    fn test_episode_round_trip() {
        let mut router = DomainRouter::default();
        router.set_domain(Domain::Episodes);
        let out = send(
            &mut router,
            &[Signal::Begin, Signal::Step(1), Signal::Confirm(2), Signal::Commit(50)],
        );
        assert_eq!(out[2], Response::Confirmed(Confirmation::Unrecognized));
        assert_eq!(out[3], Response::Committed(Some(0)));

        let out = send(&mut router, &[Signal::Begin, Signal::Step(1), Signal::Confirm(2)]);
        assert_eq!(out[2], Response::Confirmed(Confirmation::Recognized(0)));
        assert_eq!(router.episodes().outcome(0), Some(&50));
    }

    #[test]
    fn test_domains_are_isolated() {
        let mut router = DomainRouter::default();
        send(&mut router, &[Signal::Begin, Signal::Confirm(3), Signal::Commit(9)]);

        router.set_domain(Domain::Episodes);
        let out = send(&mut router, &[Signal::Begin, Signal::Confirm(3)]);
        assert_eq!(out[1], Response::Confirmed(Confirmation::Unrecognized));
        assert!(router.episodes().is_empty());
        assert_eq!(router.addition().len(), 1);
    }

    #[test]
    fn test_protocol_errors_surface() {
        let mut router = DomainRouter::default();
        assert!(matches!(
            router.dispatch(Signal::Step(1)),
            Err(MnemoError::Protocol(_))
        ));
        assert_eq!(
            router.dispatch(Signal::Commit(1)).unwrap(),
            Response::Committed(None)
        );
    }

    #[test]
    fn test_counting_then_addition() {
        let mut router = DomainRouter::default();
        router.set_domain(Domain::Counting);
        for n in 1..=4 {
            router.dispatch(Signal::Begin).unwrap();
            for _ in 0..n {
                router.dispatch(Signal::Step(0)).unwrap();
            }
            router.dispatch(Signal::Confirm(10 + n)).unwrap();
            assert_eq!(
                router.dispatch(Signal::Commit(10 + n)).unwrap(),
                Response::Committed(Some(n))
            );
        }
        assert_eq!(router.counting().position_of(13), Some(3));

        *router.arithmetic_mut() = ArithmeticBlock::new(ArithmeticSymbols {
            add: Some(90),
            equal: Some(91),
            zero: Some(10),
        });
        router.set_domain(Domain::Addition);
        let out = send(
            &mut router,
            &[Signal::Begin, Signal::Step(11), Signal::Step(90), Signal::Step(13), Signal::Step(91)],
        );
        assert_eq!(out[4], Response::Sum(vec![14]));

        // The expression itself is memorized with its answer as tail.
        let out = send(&mut router, &[Signal::Confirm(14), Signal::Commit(14)]);
        assert_eq!(out[0], Response::Confirmed(Confirmation::Unrecognized));
        assert_eq!(out[1], Response::Committed(Some(0)));
        assert_eq!(router.addition().group(0).unwrap().symbols(), &[11, 90, 13, 91, 14]);
    }

    #[test]
    fn test_rejected_operand_is_not_memorized() {
        let mut router = DomainRouter::default();
        *router.arithmetic_mut() = ArithmeticBlock::new(ArithmeticSymbols {
            add: Some(90),
            equal: Some(91),
            zero: Some(10),
        });
        send(&mut router, &[Signal::Begin, Signal::Step(555), Signal::Step(90)]);
        assert!(matches!(
            router.dispatch(Signal::Step(91)),
            Err(MnemoError::InvalidArgument(_))
        ));
        assert_eq!(router.addition().staged().unwrap().symbols(), &[555, 90]);
        assert_eq!(router.arithmetic().operands().0, &[555]);
    }

    #[test]
    fn test_addition_step_before_begin_is_rejected() {
        let mut router = DomainRouter::default();
        assert!(matches!(
            router.dispatch(Signal::Step(1)),
            Err(MnemoError::Protocol(_))
        ));
        assert!(router.arithmetic().operands().0.is_empty());
    }
}
