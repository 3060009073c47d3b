// src/core/recognition/matcher.rs
use super::types::Candidate;
use crate::core::identity::types::{IdentitySnapshot, KnownIdentity};

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Nearest enrolled identity to `probe`, if within `tolerance`.
///
/// Confidence is `1 - distance`. Ties keep the identity that comes first in
/// the snapshot. References whose length differs from the probe are not
/// comparable and are skipped.
pub fn match_embedding(probe: &[f32], snapshot: &IdentitySnapshot, tolerance: f32) -> Candidate {
    let mut best: Option<(f32, &KnownIdentity)> = None;

    for identity in snapshot.iter() {
        if identity.embedding.len() != probe.len() {
            continue;
        }
        let distance = euclidean_distance(probe, &identity.embedding);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, identity)),
        }
    }

    match best {
        Some((distance, identity)) if distance <= tolerance => Candidate {
            identity: Some(identity.id),
            confidence: (1.0 - distance).clamp(0.0, 1.0),
        },
        _ => Candidate::unknown(),
    }
}
