//! Model-token resolution: which readers serve a coordinate.

use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use point_reader::{ForecastReader, GridPointReader, PointSelection};
use pointcast_common::{PointcastError, Result};

use crate::mixer::MultiDomainMixer;
use crate::registry::{DomainKey, DomainRegistry};

/// A geographic box used by the selection rules.
#[derive(Debug, Clone, Copy)]
struct RegionBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl RegionBox {
    const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Coverage of the 2 km central-European domain.
const ICON_D2_COVERAGE: RegionBox = RegionBox::new(43.18, 58.08, -3.94, 20.34);
/// Western Europe, where the French mesoscale pair applies.
const WESTERN_EUROPE: RegionBox = RegionBox::new(37.5, 55.4, -12.0, 16.0);
/// Netherlands–Belgium box served by HARMONIE.
const NETHERLANDS_BELGIUM: RegionBox = RegionBox::new(49.35, 53.79, 2.19, 7.66);
/// Nordic analysis region: everything north of 54.9° between the
/// North Sea and the Urals side of Scandinavia.
const NORDIC: RegionBox = RegionBox::new(54.9, 72.0, -2.0, 41.0);
/// CONUS, covered by the 3 km rapid-refresh model.
const NORTH_AMERICA: RegionBox = RegionBox::new(21.14, 52.62, -134.09, -60.92);
/// Japanese mesoscale model box.
const JAPAN: RegionBox = RegionBox::new(27.4, 42.65, 125.0, 145.0);

/// A model token a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelToken {
    /// Region-aware best stack: global + regional + high-resolution
    /// overlay + ensemble probability.
    BestMatch,
    /// One producer family's hierarchy.
    IconSeamless,
    GfsSeamless,
    MeteoFranceSeamless,
    /// Exactly one domain.
    Single(DomainKey),
}

impl FromStr for ModelToken {
    type Err = PointcastError;

    fn from_str(s: &str) -> Result<Self> {
        let token = match s {
            "best_match" => ModelToken::BestMatch,
            "icon_seamless" => ModelToken::IconSeamless,
            "gfs_seamless" => ModelToken::GfsSeamless,
            "meteofrance_seamless" => ModelToken::MeteoFranceSeamless,
            "icon_global" => ModelToken::Single(DomainKey::IconGlobal),
            "icon_eu" => ModelToken::Single(DomainKey::IconEu),
            "icon_d2" => ModelToken::Single(DomainKey::IconD2),
            "icon_eps" => ModelToken::Single(DomainKey::IconEps),
            "icon_d2_eps" => ModelToken::Single(DomainKey::IconD2Eps),
            "gfs_global" => ModelToken::Single(DomainKey::GfsGlobal),
            "hrrr" => ModelToken::Single(DomainKey::Hrrr),
            "arome_france" => ModelToken::Single(DomainKey::AromeFrance),
            "arpege_europe" => ModelToken::Single(DomainKey::ArpegeEurope),
            "knmi_harmonie" => ModelToken::Single(DomainKey::KnmiHarmonie),
            "metno_nordic" => ModelToken::Single(DomainKey::MetNoNordic),
            "jma_msm" => ModelToken::Single(DomainKey::JmaMsm),
            "ecmwf_ifs" => ModelToken::Single(DomainKey::EcmwfIfs),
            other => return Err(PointcastError::UnknownModel(other.to_string())),
        };
        Ok(token)
    }
}

/// The ordered domain stack for a token at a coordinate, lowest
/// priority first. Pure function of `(token, lat, lon)`.
pub fn reader_stack(token: ModelToken, lat: f64, lon: f64) -> Vec<DomainKey> {
    match token {
        ModelToken::BestMatch => {
            let mut stack = Vec::new();
            // Probability readers sit at the head: lowest priority,
            // they only fill variables the deterministic stack lacks.
            stack.push(DomainKey::IconEps);
            if ICON_D2_COVERAGE.contains(lat, lon) {
                stack.push(DomainKey::IconD2Eps);
            }
            stack.push(DomainKey::GfsGlobal);
            stack.push(DomainKey::IconGlobal);
            if WESTERN_EUROPE.contains(lat, lon) {
                stack.push(DomainKey::ArpegeEurope);
                stack.push(DomainKey::AromeFrance);
            }
            if NORDIC.contains(lat, lon) {
                stack.push(DomainKey::MetNoNordic);
            }
            if NORTH_AMERICA.contains(lat, lon) {
                stack.push(DomainKey::Hrrr);
            }
            if JAPAN.contains(lat, lon) {
                stack.push(DomainKey::JmaMsm);
            }
            if NETHERLANDS_BELGIUM.contains(lat, lon) {
                stack.push(DomainKey::KnmiHarmonie);
            }
            if ICON_D2_COVERAGE.contains(lat, lon) {
                stack.push(DomainKey::IconD2);
            }
            stack
        }
        ModelToken::IconSeamless => {
            let mut stack = vec![DomainKey::IconGlobal, DomainKey::IconEu];
            if ICON_D2_COVERAGE.contains(lat, lon) {
                stack.push(DomainKey::IconD2);
            }
            stack
        }
        ModelToken::GfsSeamless => {
            let mut stack = vec![DomainKey::GfsGlobal];
            if NORTH_AMERICA.contains(lat, lon) {
                stack.push(DomainKey::Hrrr);
            }
            stack
        }
        ModelToken::MeteoFranceSeamless => {
            vec![DomainKey::ArpegeEurope, DomainKey::AromeFrance]
        }
        ModelToken::Single(key) => vec![key],
    }
}

/// Resolve a token to a ready-to-read mixer at a coordinate.
///
/// Multi-domain tokens tolerate individual domains that are absent or
/// do not cover the point; an explicit single-domain token fails with
/// "no data for this location" instead. An empty surviving stack is the
/// same failure.
pub async fn open_reader(
    registry: &DomainRegistry,
    token: ModelToken,
    lat: f64,
    lon: f64,
    elevation: Option<f32>,
    selection: PointSelection,
) -> Result<MultiDomainMixer> {
    let stack = reader_stack(token, lat, lon);
    let sole = matches!(token, ModelToken::Single(_));

    let mut readers: Vec<Arc<dyn ForecastReader>> = Vec::with_capacity(stack.len());
    for key in stack {
        let Some(domain) = registry.resolve(key) else {
            if sole {
                return Err(PointcastError::UnknownModel(key.archive_key().to_string()));
            }
            debug!(domain = key.archive_key(), "domain not registered, skipped");
            continue;
        };
        match GridPointReader::open(domain, lat, lon, elevation, selection) {
            Some(reader) => readers.push(Arc::new(reader)),
            None => {
                if sole {
                    return Err(PointcastError::OutsideGrid);
                }
                debug!(domain = key.archive_key(), "coordinate outside grid, skipped");
            }
        }
    }

    MultiDomainMixer::new(readers, lat, lon).ok_or(PointcastError::OutsideGrid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_central_europe() {
        // An Alpine point: global pair plus the 2 km overlay and its
        // ensemble, no French or Nordic models.
        let stack = reader_stack(ModelToken::BestMatch, 46.88, 8.67);
        assert_eq!(stack.first(), Some(&DomainKey::IconEps));
        assert_eq!(stack.last(), Some(&DomainKey::IconD2));
        assert!(stack.contains(&DomainKey::IconGlobal));
        assert!(stack.contains(&DomainKey::GfsGlobal));
        assert!(stack.contains(&DomainKey::IconD2Eps));
        assert!(!stack.contains(&DomainKey::AromeFrance));
        assert!(!stack.contains(&DomainKey::MetNoNordic));
        assert!(!stack.contains(&DomainKey::Hrrr));
    }

    #[test]
    fn test_best_match_netherlands_adds_harmonie() {
        let stack = reader_stack(ModelToken::BestMatch, 52.37, 4.89);
        assert!(stack.contains(&DomainKey::KnmiHarmonie));
        // Amsterdam is also Western Europe and D2 coverage.
        assert!(stack.contains(&DomainKey::AromeFrance));
        assert!(stack.contains(&DomainKey::IconD2));
        // HARMONIE overlays the French pair.
        let harmonie = stack
            .iter()
            .position(|k| *k == DomainKey::KnmiHarmonie)
            .unwrap();
        let arome = stack
            .iter()
            .position(|k| *k == DomainKey::AromeFrance)
            .unwrap();
        assert!(harmonie > arome);
    }

    #[test]
    fn test_best_match_scandinavia() {
        let stack = reader_stack(ModelToken::BestMatch, 59.9, 10.75);
        assert!(stack.contains(&DomainKey::MetNoNordic));
        assert!(!stack.contains(&DomainKey::JmaMsm));
    }

    #[test]
    fn test_best_match_north_america() {
        let stack = reader_stack(ModelToken::BestMatch, 39.0, -94.5);
        assert!(stack.contains(&DomainKey::Hrrr));
        assert!(!stack.contains(&DomainKey::IconD2));
        assert!(!stack.contains(&DomainKey::KnmiHarmonie));
    }

    #[test]
    fn test_best_match_japan() {
        let stack = reader_stack(ModelToken::BestMatch, 35.68, 139.69);
        assert_eq!(stack.last(), Some(&DomainKey::JmaMsm));
    }

    #[test]
    fn test_family_seamless_excludes_other_families() {
        let stack = reader_stack(ModelToken::IconSeamless, 46.88, 8.67);
        assert_eq!(
            stack,
            vec![DomainKey::IconGlobal, DomainKey::IconEu, DomainKey::IconD2]
        );
        let stack = reader_stack(ModelToken::GfsSeamless, 39.0, -94.5);
        assert_eq!(stack, vec![DomainKey::GfsGlobal, DomainKey::Hrrr]);
    }

    #[test]
    fn test_single_token_is_exactly_one() {
        let stack = reader_stack(ModelToken::Single(DomainKey::EcmwfIfs), 0.0, 0.0);
        assert_eq!(stack, vec![DomainKey::EcmwfIfs]);
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!(
            "best_match".parse::<ModelToken>().unwrap(),
            ModelToken::BestMatch
        );
        assert_eq!(
            "hrrr".parse::<ModelToken>().unwrap(),
            ModelToken::Single(DomainKey::Hrrr)
        );
        assert!("nonsense_model".parse::<ModelToken>().is_err());
    }
}
