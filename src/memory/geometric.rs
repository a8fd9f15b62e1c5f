//! Quantity ordering and single-digit addition.
//!
//! [`CountingNetwork`] learns the order of quantity symbols: the n-th STEP
//! after BEGIN selects position n, and COMMIT binds a symbol to it. Recall is
//! by position or by symbol.
//!
//! [`ArithmeticBlock`] adds two numbers written as digit symbols. Each digit
//! pair is counted out on a ten-position [`AdditionRing`]; wrapping past the
//! last position raises a carry consumed by the next pair.

use serde::{Deserialize, Serialize};

use super::snapshot::Persistent;
use crate::error::{MnemoError, Result};
use crate::kernel::{Confirmation, Phase, SignalProtocol, SymbolId};

// =============================================================================
// Counting
// =============================================================================

/// Ordered positions, each optionally bound to a quantity symbol.
///
/// Positions are 1-based: position 0 is the implicit empty count.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CountingNetwork {
    positions: Vec<Option<SymbolId>>,
    index: usize,
    phase: Phase,
}

impl CountingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest position reached so far.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Current position in the count in flight.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn quantity_at(&self, position: usize) -> Option<SymbolId> {
        position
            .checked_sub(1)
            .and_then(|i| self.positions.get(i))
            .copied()
            .flatten()
    }

    pub fn position_of(&self, symbol: SymbolId) -> Option<usize> {
        self.positions
            .iter()
            .position(|q| *q == Some(symbol))
            .map(|i| i + 1)
    }

    pub fn begin(&mut self) -> Result<()> {
        self.index = 0;
        self.phase = Phase::Stepping;
        Ok(())
    }

    /// Move to the next position, growing the network when needed.
    pub fn step(&mut self) -> Result<()> {
        if self.phase != Phase::Stepping {
            return Err(MnemoError::Protocol("STEP before BEGIN".into()));
        }
        self.index += 1;
        if self.positions.len() < self.index {
            self.positions.push(None);
        }
        Ok(())
    }

    /// Report the position already bound to `symbol`, or arm COMMIT.
    pub fn confirm(&mut self, symbol: SymbolId) -> Result<Confirmation> {
        if self.phase != Phase::Stepping {
            return Err(MnemoError::Protocol("CONFIRM before BEGIN".into()));
        }
        match self.position_of(symbol) {
            Some(position) => {
                self.phase = Phase::Idle;
                Ok(Confirmation::Recognized(position))
            }
            None => {
                self.phase = Phase::AwaitingCommit;
                Ok(Confirmation::Unrecognized)
            }
        }
    }

    /// Bind `symbol` to the current position unless that position already
    /// holds a quantity. Returns the position.
    pub fn commit(&mut self, symbol: SymbolId) -> Result<Option<usize>> {
        if self.phase != Phase::AwaitingCommit {
            return Ok(None);
        }
        self.phase = Phase::Idle;
        if self.index == 0 {
            return Err(MnemoError::Protocol("COMMIT with no position selected".into()));
        }
        let slot = &mut self.positions[self.index - 1];
        if slot.is_none() {
            *slot = Some(symbol);
            tracing::debug!(position = self.index, symbol, "quantity bound");
        }
        Ok(Some(self.index))
    }

    pub fn verify(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for q in self.positions.iter().flatten() {
            if !seen.insert(*q) {
                return Err(MnemoError::InconsistentState(format!(
                    "symbol {} bound to several positions",
                    q
                )));
            }
        }
        if self.index > self.positions.len() {
            return Err(MnemoError::InconsistentState(format!(
                "index {} past {} positions",
                self.index,
                self.positions.len()
            )));
        }
        Ok(())
    }
}

impl SignalProtocol for CountingNetwork {
    type Symbol = SymbolId;
    type Tail = SymbolId;

    fn begin(&mut self) -> Result<()> {
        CountingNetwork::begin(self)
    }

    /// The stepped symbol is not stored; each STEP counts one.
    fn step(&mut self, _symbol: SymbolId) -> Result<()> {
        CountingNetwork::step(self)
    }

    fn confirm(&mut self, symbol: SymbolId) -> Result<Confirmation> {
        CountingNetwork::confirm(self, symbol)
    }

    fn commit(&mut self, symbol: SymbolId) -> Result<Option<usize>> {
        CountingNetwork::commit(self, symbol)
    }
}

impl Persistent for CountingNetwork {
    const KIND: &'static str = "counting";

    fn verify(&self) -> Result<()> {
        CountingNetwork::verify(self)
    }
}

// =============================================================================
// Addition
// =============================================================================

/// Ten-position ring with a carry flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionRing {
    index: usize,
    carry: bool,
}

impl AdditionRing {
    pub const DIGITS: usize = 10;

    /// Start a digit; a pending carry starts it at one.
    pub fn begin(&mut self) {
        self.index = usize::from(self.carry);
        self.carry = false;
    }

    pub fn step(&mut self) {
        self.index += 1;
        if self.index >= Self::DIGITS {
            self.index = 0;
            self.carry = true;
        }
    }

    pub fn value(&self) -> usize {
        self.index
    }

    pub fn has_carry(&self) -> bool {
        self.carry
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Symbols with a fixed role in arithmetic input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticSymbols {
    pub add: Option<SymbolId>,
    pub equal: Option<SymbolId>,
    pub zero: Option<SymbolId>,
}

/// Adds two digit-symbol numbers using the quantities of a
/// [`CountingNetwork`].
///
/// Input is fed one symbol at a time: digits of the first operand, the add
/// operator, digits of the second operand, then the equal sign, which
/// produces the sum (most significant digit first).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArithmeticBlock {
    symbols: ArithmeticSymbols,
    #[serde(skip)]
    ring: AdditionRing,
    #[serde(skip)]
    first: Vec<SymbolId>,
    #[serde(skip)]
    second: Vec<SymbolId>,
    #[serde(skip)]
    operator: Option<SymbolId>,
    #[serde(skip)]
    result: Vec<SymbolId>,
}

impl ArithmeticBlock {
    pub fn new(symbols: ArithmeticSymbols) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    pub fn symbols(&self) -> ArithmeticSymbols {
        self.symbols
    }

    pub fn set_add(&mut self, symbol: SymbolId) {
        self.symbols.add = Some(symbol);
    }

    pub fn set_equal(&mut self, symbol: SymbolId) {
        self.symbols.equal = Some(symbol);
    }

    pub fn set_zero(&mut self, symbol: SymbolId) {
        self.symbols.zero = Some(symbol);
    }

    /// Digits of the first and second operand fed so far.
    pub fn operands(&self) -> (&[SymbolId], &[SymbolId]) {
        (&self.first, &self.second)
    }

    /// Last computed sum.
    pub fn result(&self) -> &[SymbolId] {
        &self.result
    }

    /// Clear operands and result.
    pub fn begin(&mut self) {
        self.ring.reset();
        self.first.clear();
        self.second.clear();
        self.operator = None;
        self.result.clear();
    }

    /// Feed one symbol. Returns the sum when `symbol` is the equal sign.
    pub fn feed(&mut self, symbol: SymbolId, counting: &CountingNetwork) -> Result<Option<&[SymbolId]>> {
        if Some(symbol) == self.symbols.add {
            self.operator = Some(symbol);
        } else if Some(symbol) == self.symbols.equal {
            if self.operator.is_none() {
                return Err(MnemoError::InvalidArgument(
                    "equal sign without an operator".into(),
                ));
            }
            self.result = self.add(counting)?;
            return Ok(Some(&self.result));
        } else if self.operator.is_none() {
            self.first.push(symbol);
        } else {
            self.second.push(symbol);
        }
        Ok(None)
    }

    /// Sum the operands. Nothing is consumed unless every digit resolves.
    fn add(&mut self, counting: &CountingNetwork) -> Result<Vec<SymbolId>> {
        let width = self.first.len().max(self.second.len());
        let mut ring = self.ring;
        let mut digits = Vec::with_capacity(width + 1);

        for place in 1..=width {
            let a = self.count_of(nth_from_end(&self.first, place), counting)?;
            let b = self.count_of(nth_from_end(&self.second, place), counting)?;
            ring.begin();
            for _ in 0..a + b {
                ring.step();
            }
            digits.push(ring.value());
        }
        if ring.has_carry() {
            ring.begin();
            digits.push(ring.value());
        }

        let sum = digits
            .into_iter()
            .rev()
            .map(|d| self.symbol_of(d, counting))
            .collect::<Result<Vec<_>>>()?;
        self.ring = ring;
        self.first.clear();
        self.second.clear();
        Ok(sum)
    }

    /// Quantity of a digit symbol; a missing digit counts as zero.
    fn count_of(&self, digit: Option<SymbolId>, counting: &CountingNetwork) -> Result<usize> {
        match digit {
            None => Ok(0),
            Some(s) if Some(s) == self.symbols.zero => Ok(0),
            Some(s) => counting.position_of(s).ok_or_else(|| {
                MnemoError::InvalidArgument(format!("symbol {} is not a known quantity", s))
            }),
        }
    }

    fn symbol_of(&self, digit: usize, counting: &CountingNetwork) -> Result<SymbolId> {
        let symbol = if digit == 0 {
            self.symbols.zero
        } else {
            counting.quantity_at(digit)
        };
        symbol.ok_or_else(|| {
            MnemoError::InvalidArgument(format!("no symbol learned for digit {}", digit))
        })
    }
}

fn nth_from_end(digits: &[SymbolId], place: usize) -> Option<SymbolId> {
    digits.len().checked_sub(place).map(|i| digits[i])
}

impl Persistent for ArithmeticBlock {
    const KIND: &'static str = "arithmetic";
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: SymbolId = 100;
    const ADD: SymbolId = 200;
    const EQUAL: SymbolId = 201;

    /// Position n bound to symbol 100 + n.
    fn counted_to_nine() -> CountingNetwork {
        let mut net = CountingNetwork::new();
        for n in 1..=9 {
            net.begin().unwrap();
            for _ in 0..n {
                net.step().unwrap();
            }
            assert_eq!(net.confirm(ZERO + n).unwrap(), Confirmation::Unrecognized);
            assert_eq!(net.commit(ZERO + n).unwrap(), Some(n));
        }
        net
    }

    fn block() -> ArithmeticBlock {
        ArithmeticBlock::new(ArithmeticSymbols {
            add: Some(ADD),
            equal: Some(EQUAL),
            zero: Some(ZERO),
        })
    }

    fn digits(n: usize) -> Vec<SymbolId> {
        n.to_string()
            .chars()
            .map(|c| ZERO + c.to_digit(10).map_or(0, |d| d as usize))
            .collect()
    }

    fn sum(block: &mut ArithmeticBlock, counting: &CountingNetwork, a: usize, b: usize) -> Vec<SymbolId> {
        block.begin();
        let mut input = digits(a);
        input.push(ADD);
        input.extend(digits(b));
        for s in input {
            assert!(block.feed(s, counting).unwrap().is_none());
        }
        block.feed(EQUAL, counting).unwrap().unwrap().to_vec()
    }

    #[test]
    fn test_counting_positions() {
        let net = counted_to_nine();
        assert_eq!(net.len(), 9);
        assert_eq!(net.quantity_at(3), Some(103));
        assert_eq!(net.quantity_at(0), None);
        assert_eq!(net.quantity_at(10), None);
        assert_eq!(net.position_of(107), Some(7));
        assert_eq!(net.position_of(ZERO), None);
        assert!(net.verify().is_ok());
    }

    #[test]
    fn test_counting_recalls_known_symbol() {
        let mut net = counted_to_nine();
        net.begin().unwrap();
        net.step().unwrap();
        assert_eq!(net.confirm(105).unwrap(), Confirmation::Recognized(5));
        assert_eq!(net.commit(999).unwrap(), None);
    }

    #[test]
    fn test_counting_keeps_first_binding() {
        let mut net = CountingNetwork::new();
        net.begin().unwrap();
        net.step().unwrap();
        net.confirm(1).unwrap();
        net.commit(1).unwrap();

        net.begin().unwrap();
        net.step().unwrap();
        net.confirm(2).unwrap();
        assert_eq!(net.commit(2).unwrap(), Some(1));
        assert_eq!(net.quantity_at(1), Some(1));
    }

    #[test]
    fn test_counting_protocol_errors() {
        let mut net = CountingNetwork::new();
        assert!(matches!(net.step(), Err(MnemoError::Protocol(_))));
        net.begin().unwrap();
        net.confirm(1).unwrap();
        assert!(matches!(net.commit(1), Err(MnemoError::Protocol(_))));
    }

    #[test]
    fn test_ring_wraps_with_carry() {
        let mut ring = AdditionRing::default();
        ring.begin();
        for _ in 0..12 {
            ring.step();
        }
        assert_eq!(ring.value(), 2);
        assert!(ring.has_carry());
        ring.begin();
        assert_eq!(ring.value(), 1);
        assert!(!ring.has_carry());
    }

    #[test]
    fn test_single_digit_sums() {
        let counting = counted_to_nine();
        let mut block = block();
        assert_eq!(sum(&mut block, &counting, 2, 1), digits(3));
        assert_eq!(sum(&mut block, &counting, 4, 5), digits(9));
        assert_eq!(sum(&mut block, &counting, 7, 8), digits(15));
        assert_eq!(sum(&mut block, &counting, 5, 5), digits(10));
        assert_eq!(sum(&mut block, &counting, 0, 0), digits(0));
    }

    #[test]
    fn test_multi_digit_sums_with_carry() {
        let counting = counted_to_nine();
        let mut block = block();
        assert_eq!(sum(&mut block, &counting, 526, 574), digits(1100));
        assert_eq!(sum(&mut block, &counting, 999, 1), digits(1000));
        assert_eq!(sum(&mut block, &counting, 30, 4005), digits(4035));
        assert_eq!(block.result(), digits(4035).as_slice());
    }

    #[test]
    fn test_unknown_operand_is_invalid() {
        let counting = counted_to_nine();
        let mut block = block();
        block.begin();
        block.feed(555, &counting).unwrap();
        block.feed(ADD, &counting).unwrap();
        block.feed(101, &counting).unwrap();
        assert!(matches!(
            block.feed(EQUAL, &counting),
            Err(MnemoError::InvalidArgument(_))
        ));
        assert_eq!(block.operands(), (&[555][..], &[101][..]));
        assert!(block.result().is_empty());
    }

    #[test]
    fn test_failed_sum_keeps_previous_result() {
        let counting = counted_to_nine();
        let mut block = block();
        assert_eq!(sum(&mut block, &counting, 2, 3), digits(5));

        // The operator stays armed, so further digits extend the second operand.
        block.feed(555, &counting).unwrap();
        assert!(block.feed(EQUAL, &counting).is_err());
        assert_eq!(block.result(), digits(5).as_slice());
        assert_eq!(block.operands(), (&[][..], &[555][..]));
    }

    #[test]
    fn test_equal_without_operator_is_invalid() {
        let counting = counted_to_nine();
        let mut block = block();
        block.begin();
        block.feed(101, &counting).unwrap();
        assert!(block.feed(EQUAL, &counting).is_err());
    }

    #[test]
    fn test_missing_zero_symbol() {
        let counting = counted_to_nine();
        let mut block = ArithmeticBlock::new(ArithmeticSymbols {
            add: Some(ADD),
            equal: Some(EQUAL),
            zero: None,
        });
        block.begin();
        for s in [105, ADD, 105] {
            block.feed(s, &counting).unwrap();
        }
        assert!(matches!(
            block.feed(EQUAL, &counting),
            Err(MnemoError::InvalidArgument(_))
        ));
    }
}
