//! Factor algebra for exact inference.
//!
//! A [`Factor`] is a transient, unnormalized function from joint
//! assignments of a variable subset to non-negative weight. Factors are
//! instantiated from CPTs (with evidence axes sliced out), multiplied, and
//! summed out during variable elimination; they are never persisted and
//! never shared between queries.
//!
//! Layout: the scope is kept sorted by `VarId` and values are dense
//! row-major with the last scope axis varying fastest. All index walking is
//! odometer-style, so products and marginalizations are single linear
//! passes without per-entry index decoding.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::cpt::ConditionalProbabilityTable;
use crate::engine::network::VarId;

/// Inline scope capacity; the widest factor in the cardiovascular network
/// spans 11 variables, so spills are rare but allowed.
type ScopeVec = SmallVec<[VarId; 12]>;
type CardVec = SmallVec<[usize; 12]>;
type StrideVec = SmallVec<[usize; 12]>;

#[derive(Debug, Clone)]
pub(crate) struct Factor {
    /// Scope variables, sorted ascending by `VarId`.
    scope: ScopeVec,
    /// Domain cardinalities aligned with `scope`.
    cards: CardVec,
    /// Dense row-major weights, last scope axis fastest.
    values: Vec<f64>,
}

impl Factor {
    /// A scope-less factor holding a single weight.
    pub(crate) fn scalar(weight: f64) -> Self {
        Self {
            scope: ScopeVec::new(),
            cards: CardVec::new(),
            values: vec![weight],
        }
    }

    pub(crate) fn scope(&self) -> &[VarId] {
        &self.scope
    }

    pub(crate) fn cards(&self) -> &[usize] {
        &self.cards
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn mentions(&self, var: VarId) -> bool {
        self.scope.binary_search(&var).is_ok()
    }

    /// Sum of all weights.
    pub(crate) fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Instantiates a factor from a CPT, restricted to rows consistent
    /// with the evidence. Evidence variables are sliced out of the scope
    /// entirely; their observed index contributes a fixed offset.
    pub(crate) fn from_cpt(
        cpt: &ConditionalProbabilityTable,
        evidence: &FxHashMap<VarId, usize>,
    ) -> Self {
        // Full CPT axes: parents in stored order, then the child (fastest).
        let parent_strides = cpt.parent_strides();
        let child_card = cpt.child_cardinality();

        let mut base_offset = 0usize;
        let mut free: SmallVec<[(VarId, usize, usize); 12]> = SmallVec::new();

        for (pos, parent) in cpt.parents().iter().enumerate() {
            let stride = parent_strides[pos] * child_card;
            match evidence.get(parent) {
                Some(observed) => base_offset += observed * stride,
                None => free.push((*parent, cpt.parent_cards()[pos], stride)),
            }
        }
        match evidence.get(&cpt.child()) {
            Some(observed) => base_offset += *observed,
            None => free.push((cpt.child(), child_card, 1)),
        }

        free.sort_unstable_by_key(|(var, _, _)| *var);

        let scope: ScopeVec = free.iter().map(|(var, _, _)| *var).collect();
        let cards: CardVec = free.iter().map(|(_, card, _)| *card).collect();
        let strides: StrideVec = free.iter().map(|(_, _, stride)| *stride).collect();
        let len: usize = cards.iter().product();

        let mut values = Vec::with_capacity(len);
        let mut idx: SmallVec<[usize; 12]> = smallvec::smallvec![0; cards.len()];
        let mut offset = base_offset;
        let source = cpt.values();
        for step in 0..len {
            values.push(source[offset]);
            if step + 1 == len {
                break;
            }
            // Odometer increment, last axis fastest.
            for axis in (0..cards.len()).rev() {
                idx[axis] += 1;
                offset += strides[axis];
                if idx[axis] < cards[axis] {
                    break;
                }
                idx[axis] = 0;
                offset -= strides[axis] * cards[axis];
            }
        }

        Self {
            scope,
            cards,
            values,
        }
    }

    /// Pointwise product over the union scope.
    pub(crate) fn product(&self, other: &Factor) -> Factor {
        let mut scope = ScopeVec::new();
        let mut cards = CardVec::new();
        {
            let (mut i, mut j) = (0usize, 0usize);
            while i < self.scope.len() || j < other.scope.len() {
                let take_left = match (self.scope.get(i), other.scope.get(j)) {
                    (Some(a), Some(b)) => {
                        if a == b {
                            scope.push(*a);
                            cards.push(self.cards[i]);
                            i += 1;
                            j += 1;
                            continue;
                        }
                        a < b
                    }
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (None, None) => break,
                };
                if take_left {
                    scope.push(self.scope[i]);
                    cards.push(self.cards[i]);
                    i += 1;
                } else {
                    scope.push(other.scope[j]);
                    cards.push(other.cards[j]);
                    j += 1;
                }
            }
        }

        let left_strides = aligned_strides(&scope, &self.scope, &self.cards);
        let right_strides = aligned_strides(&scope, &other.scope, &other.cards);

        let len: usize = cards.iter().product();
        let mut values = Vec::with_capacity(len);
        let mut idx: SmallVec<[usize; 12]> = smallvec::smallvec![0; cards.len()];
        let (mut left_off, mut right_off) = (0usize, 0usize);
        for step in 0..len {
            values.push(self.values[left_off] * other.values[right_off]);
            if step + 1 == len {
                break;
            }
            for axis in (0..cards.len()).rev() {
                idx[axis] += 1;
                left_off += left_strides[axis];
                right_off += right_strides[axis];
                if idx[axis] < cards[axis] {
                    break;
                }
                idx[axis] = 0;
                left_off -= left_strides[axis] * cards[axis];
                right_off -= right_strides[axis] * cards[axis];
            }
        }

        Factor {
            scope,
            cards,
            values,
        }
    }

    /// Sums a variable out of the factor, dropping it from the scope.
    pub(crate) fn sum_out(&self, var: VarId) -> Factor {
        let axis = match self.scope.binary_search(&var) {
            Ok(axis) => axis,
            // Summing out an absent variable is the identity.
            Err(_) => return self.clone(),
        };

        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        scope.remove(axis);
        let removed_card = cards.remove(axis);

        let len: usize = cards.iter().product();
        let mut values = vec![0.0f64; len];

        // Strides of the result aligned to the source axes; the removed
        // axis contributes stride 0 so all its slices accumulate together.
        let mut result_strides: StrideVec = smallvec::smallvec![0; self.cards.len()];
        {
            let mut stride = 1usize;
            let mut source_axes: SmallVec<[usize; 12]> =
                (0..self.cards.len()).filter(|a| *a != axis).collect();
            source_axes.reverse();
            for source_axis in source_axes {
                result_strides[source_axis] = stride;
                stride *= self.cards[source_axis];
            }
        }

        let mut idx: SmallVec<[usize; 12]> = smallvec::smallvec![0; self.cards.len()];
        let mut out_off = 0usize;
        let source_len = self.values.len();
        for step in 0..source_len {
            values[out_off] += self.values[step];
            if step + 1 == source_len {
                break;
            }
            for source_axis in (0..self.cards.len()).rev() {
                idx[source_axis] += 1;
                out_off += result_strides[source_axis];
                if idx[source_axis] < self.cards[source_axis] {
                    break;
                }
                idx[source_axis] = 0;
                out_off -= result_strides[source_axis] * self.cards[source_axis];
            }
        }

        debug_assert_eq!(removed_card * len, source_len);

        Factor {
            scope,
            cards,
            values,
        }
    }
}

/// Strides of `inner` aligned to the axes of `outer`; axes absent from
/// `inner` get stride 0 (the operand is constant along them).
fn aligned_strides(outer: &[VarId], inner: &[VarId], inner_cards: &[usize]) -> StrideVec {
    let mut inner_strides: StrideVec = smallvec::smallvec![0; inner.len()];
    let mut stride = 1usize;
    for axis in (0..inner.len()).rev() {
        inner_strides[axis] = stride;
        stride *= inner_cards[axis];
    }

    outer
        .iter()
        .map(|var| match inner.binary_search(var) {
            Ok(axis) => inner_strides[axis],
            Err(_) => 0,
        })
        .collect()
}
