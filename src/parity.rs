//! Parity-condition arithmetic: which priorities are good, which priority
//! dominates in the limit of a run, and how to translate priorities between
//! the four parity condition types.

use crate::Priority;

/// The four flavors of the parity acceptance condition. The min/max half
/// determines which priority among those seen infinitely often decides a run,
/// the even/odd half determines which parity of that priority is accepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParityType {
    /// The least priority seen infinitely often must be even.
    MinEven,
    /// The least priority seen infinitely often must be odd.
    MinOdd,
    /// The greatest priority seen infinitely often must be even.
    MaxEven,
    /// The greatest priority seen infinitely often must be odd.
    MaxOdd,
}

impl ParityType {
    /// Whether the least priority in the limit decides acceptance.
    pub fn is_min(self) -> bool {
        matches!(self, ParityType::MinEven | ParityType::MinOdd)
    }

    /// Whether even priorities are the accepting ones.
    pub fn is_even(self) -> bool {
        matches!(self, ParityType::MinEven | ParityType::MaxEven)
    }
}

/// Returns whether priority `p` is good, i.e. accepting when it decides a run.
pub fn good_priority(t: ParityType, p: Priority) -> bool {
    (p % 2 == 0) == t.is_even()
}

/// Returns the priority that dominates in the infinite-trace limit. Ties
/// resolve to `p`.
pub fn stronger_priority(t: ParityType, p: Priority, q: Priority) -> Priority {
    if t.is_min() {
        if q < p {
            q
        } else {
            p
        }
    } else if q > p {
        q
    } else {
        p
    }
}

/// Builds a bijection on priorities that translates the condition type `from`
/// into `to`, given that all used priorities lie in `[pmin, pmax]`. A word
/// accepted under `from` with the original priorities is accepted under `to`
/// with the transformed ones.
///
/// Changing the even/odd polarity shifts every priority by one (downwards
/// whenever `pmin` permits, so that translating back is the exact inverse).
/// Changing between min and max reflects the range.
pub fn priority_transformer(
    from: ParityType,
    to: ParityType,
    pmin: Priority,
    pmax: Priority,
) -> impl Fn(Priority) -> Priority {
    assert!(pmin <= pmax);
    let polarity_change = from.is_even() != to.is_even();
    let direction_change = from.is_min() != to.is_min();
    // shift downwards when the range allows it, so that the reverse
    // transformation undoes the shift exactly
    let shift_up = pmin == 0;
    // reflection point: the least value at or above pmax with the parity
    // that maps good priorities of `from` onto good priorities of `to`
    let want = (u32::from(!from.is_even()) + u32::from(!to.is_even())) % 2;
    let pivot = if pmax % 2 == want { pmax } else { pmax + 1 };
    move |p| {
        if direction_change {
            pivot - p
        } else if !polarity_change {
            p
        } else if shift_up {
            p + 1
        } else {
            p - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParityType::*;

    const ALL: [ParityType; 4] = [MinEven, MinOdd, MaxEven, MaxOdd];

    #[test]
    fn goodness() {
        assert!(good_priority(MinEven, 0));
        assert!(!good_priority(MinEven, 1));
        assert!(good_priority(MinOdd, 3));
        assert!(good_priority(MaxEven, 2));
        assert!(!good_priority(MaxOdd, 0));
    }

    #[test]
    fn dominance() {
        assert_eq!(stronger_priority(MinEven, 1, 2), 1);
        assert_eq!(stronger_priority(MinOdd, 2, 1), 1);
        assert_eq!(stronger_priority(MaxEven, 1, 2), 2);
        assert_eq!(stronger_priority(MaxOdd, 2, 1), 2);
        // ties return the first argument
        assert_eq!(stronger_priority(MinEven, 3, 3), 3);
    }

    #[test]
    fn transformer_preserves_goodness_and_dominance() {
        for &a in &ALL {
            for &b in &ALL {
                for (pmin, pmax) in [(0, 5), (1, 6), (0, 0), (1, 1)] {
                    let f = priority_transformer(a, b, pmin, pmax);
                    for p in pmin..=pmax {
                        assert_eq!(
                            good_priority(a, p),
                            good_priority(b, f(p)),
                            "{a:?}->{b:?} on {p} in [{pmin},{pmax}]"
                        );
                        for q in pmin..=pmax {
                            assert_eq!(
                                f(stronger_priority(a, p, q)),
                                stronger_priority(b, f(p), f(q)),
                                "{a:?}->{b:?} on ({p},{q})"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn transformer_round_trips() {
        for &a in &ALL {
            for &b in &ALL {
                for (pmin, pmax) in [(0, 5), (1, 6), (0, 3), (1, 4)] {
                    let f = priority_transformer(a, b, pmin, pmax);
                    let (fmin, fmax) = {
                        let (x, y) = (f(pmin), f(pmax));
                        (x.min(y), x.max(y))
                    };
                    let g = priority_transformer(b, a, fmin, fmax);
                    for p in pmin..=pmax {
                        assert_eq!(g(f(p)), p, "{a:?}->{b:?} on {p} in [{pmin},{pmax}]");
                    }
                }
            }
        }
    }
}
