//! Merging of road segments into connected chains.
//!
//! `OpenStreetMap` splits a named street into many ways. Ways that share an
//! endpoint are joined (reversing them where needed) into maximal chains.
//! A street that is still split after merging keeps only its longest chain
//! unless the caller asks for fragmentation to be an error.

use geo::{Coord, Haversine, Length, LineString};

use crate::RoadError;

/// Endpoints closer than this (in degrees, per axis) are treated as shared.
pub const ENDPOINT_TOLERANCE_DEG: f64 = 1e-9;

fn same_point(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= ENDPOINT_TOLERANCE_DEG && (a.y - b.y).abs() <= ENDPOINT_TOLERANCE_DEG
}

/// Joins segments that share endpoints into maximal chains.
///
/// Segments with fewer than two vertices are ignored. Chains are built
/// greedily in input order, so the result is deterministic. Repeated
/// consecutive vertices are collapsed.
#[must_use]
pub fn merge_segments(segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut remaining: Vec<Vec<Coord<f64>>> =
        segments.into_iter().filter(|s| s.len() >= 2).collect();
    let mut chains = Vec::new();

    while !remaining.is_empty() {
        let mut chain = remaining.remove(0);

        loop {
            let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
                break;
            };

            let Some((position, join)) = remaining.iter().enumerate().find_map(|(i, seg)| {
                let (first, last) = (seg[0], seg[seg.len() - 1]);
                if same_point(tail, first) {
                    Some((i, Join::AppendForward))
                } else if same_point(tail, last) {
                    Some((i, Join::AppendReversed))
                } else if same_point(head, last) {
                    Some((i, Join::PrependForward))
                } else if same_point(head, first) {
                    Some((i, Join::PrependReversed))
                } else {
                    None
                }
            }) else {
                break;
            };

            let mut segment = remaining.remove(position);
            match join {
                Join::AppendForward => chain.extend(segment.into_iter().skip(1)),
                Join::AppendReversed => {
                    segment.reverse();
                    chain.extend(segment.into_iter().skip(1));
                }
                Join::PrependForward => {
                    segment.pop();
                    segment.append(&mut chain);
                    chain = segment;
                }
                Join::PrependReversed => {
                    segment.reverse();
                    segment.pop();
                    segment.append(&mut chain);
                    chain = segment;
                }
            }
        }

        chain.dedup();
        chains.push(LineString::new(chain));
    }

    chains
}

#[derive(Debug, Clone, Copy)]
enum Join {
    AppendForward,
    AppendReversed,
    PrependForward,
    PrependReversed,
}

/// Picks the chain to analyse from a merged street.
///
/// With a single chain it is returned as is. With several, the longest
/// (by great-circle length, first wins on ties) is kept and the others are
/// dropped with a warning, or [`RoadError::FragmentedRoad`] is returned
/// when `fail_on_fragmented` is set.
///
/// # Errors
///
/// Returns [`RoadError::InvalidGeometry`] when there are no chains, and
/// [`RoadError::FragmentedRoad`] as described above.
pub fn select_chain(
    chains: Vec<LineString<f64>>,
    fail_on_fragmented: bool,
) -> Result<LineString<f64>, RoadError> {
    let count = chains.len();

    if count > 1 && fail_on_fragmented {
        return Err(RoadError::FragmentedRoad { chains: count });
    }

    let mut best: Option<(f64, LineString<f64>)> = None;
    for chain in chains {
        let length = Haversine.length(&chain);
        if best.as_ref().is_none_or(|(best_length, _)| length > *best_length) {
            best = Some((length, chain));
        }
    }

    let Some((length, chain)) = best else {
        return Err(RoadError::InvalidGeometry {
            reason: "no road segments to merge".to_string(),
        });
    };

    if count > 1 {
        log::warn!(
            "Road consists of {count} disconnected segments; \
             keeping the longest ({length:.0} m) and discarding {} others",
            count - 1
        );
    }

    Ok(chain)
}
