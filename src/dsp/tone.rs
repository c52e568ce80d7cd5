//! Three-band tone stack: low shelf, peaking mid, high shelf.

use log::warn;

use super::effect::{Effect, EffectKind, ParamSpec, find_spec, validate};
use super::filter::{Biquad, FilterCoefficients, FilterType};
use crate::error::{Result, RigError};

/// Highest usable band frequency, as a fraction of the sample rate.
const MAX_FREQ_RATIO: f64 = 0.49;

pub(crate) const TONE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("bass_gain", -15.0, 15.0, 0.0, "dB"),
    ParamSpec::new("bass_freq", 20.0, 1000.0, 120.0, "Hz"),
    ParamSpec::new("bass_q", 0.1, 10.0, 0.707, ""),
    ParamSpec::new("mid_gain", -15.0, 15.0, 0.0, "dB"),
    ParamSpec::new("mid_freq", 100.0, 8000.0, 800.0, "Hz"),
    ParamSpec::new("mid_q", 0.1, 10.0, 0.9, ""),
    ParamSpec::new("treble_gain", -15.0, 15.0, 0.0, "dB"),
    ParamSpec::new("treble_freq", 1000.0, 20000.0, 3200.0, "Hz"),
    ParamSpec::new("treble_q", 0.1, 10.0, 0.707, ""),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Band {
    Bass,
    Mid,
    Treble,
}

impl Band {
    fn index(self) -> usize {
        match self {
            Band::Bass => 0,
            Band::Mid => 1,
            Band::Treble => 2,
        }
    }

    fn filter_type(self) -> FilterType {
        match self {
            Band::Bass => FilterType::LowShelf,
            Band::Mid => FilterType::Peaking,
            Band::Treble => FilterType::HighShelf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Gain,
    Freq,
    Q,
}

fn split_name(name: &str) -> Option<(Band, Field)> {
    let (band, field) = name.split_once('_')?;
    let band = match band {
        "bass" => Band::Bass,
        "mid" => Band::Mid,
        "treble" => Band::Treble,
        _ => return None,
    };
    let field = match field {
        "gain" => Field::Gain,
        "freq" => Field::Freq,
        "q" => Field::Q,
        _ => return None,
    };
    Some((band, field))
}

#[derive(Debug, Clone, Copy)]
struct BandSettings {
    gain_db: f64,
    freq: f64,
    q: f64,
}

/// Parametric EQ of three cascaded biquads.
///
/// Coefficients are designed only when a parameter changes. Band
/// frequencies at or above `0.49 * sample_rate` are rejected, which keeps
/// every stage strictly below Nyquist and therefore stable.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    sample_rate: u32,
    settings: [BandSettings; 3],
    stages: [Biquad; 3],
}

impl ToneFilter {
    /// Create a flat tone stack.
    ///
    /// Fails with [`RigError::InvalidSampleRate`] when some band's lowest
    /// frequency is already at or above `0.49 * sample_rate`. A default
    /// frequency above that limit is pulled down to half of it, but never
    /// below the band's own minimum.
    pub fn new(sample_rate: u32) -> Result<Self> {
        let max_freq = sample_rate as f64 * MAX_FREQ_RATIO;
        let band = |offset: usize| -> Result<BandSettings> {
            let freq_spec = &TONE_PARAMS[offset + 1];
            if freq_spec.min >= max_freq {
                return Err(RigError::InvalidSampleRate(sample_rate));
            }
            let mut freq = freq_spec.default;
            if freq >= max_freq {
                freq = (max_freq * 0.5).max(freq_spec.min);
                warn!(
                    "{} default {} Hz is above the usable range at {} Hz, using {} Hz",
                    freq_spec.name, freq_spec.default, sample_rate, freq
                );
            }
            Ok(BandSettings {
                gain_db: TONE_PARAMS[offset].default,
                freq,
                q: TONE_PARAMS[offset + 2].default,
            })
        };
        let settings = [band(0)?, band(3)?, band(6)?];
        let stages = [Band::Bass, Band::Mid, Band::Treble].map(|b| {
            Biquad::new(design(b, &settings[b.index()], sample_rate))
        });
        Ok(ToneFilter {
            sample_rate,
            settings,
            stages,
        })
    }

    /// Create a tone stack with the three band gains set, other values at
    /// their defaults.
    pub fn with_gains(sample_rate: u32, bass_db: f64, mid_db: f64, treble_db: f64) -> Result<Self> {
        let mut tone = Self::new(sample_rate)?;
        tone.set_parameter("bass_gain", bass_db)?;
        tone.set_parameter("mid_gain", mid_db)?;
        tone.set_parameter("treble_gain", treble_db)?;
        Ok(tone)
    }

    /// Coefficients currently in use, bass to treble.
    pub fn coefficients(&self) -> [FilterCoefficients; 3] {
        [
            self.stages[0].coefficients(),
            self.stages[1].coefficients(),
            self.stages[2].coefficients(),
        ]
    }

    /// Combined magnitude response of the three stages at `frequency`.
    pub fn magnitude_at(&self, frequency: f64) -> f64 {
        self.stages
            .iter()
            .map(|s| s.coefficients().magnitude_at(frequency, self.sample_rate as f64))
            .product()
    }
}

fn design(band: Band, s: &BandSettings, sample_rate: u32) -> FilterCoefficients {
    let coeffs = FilterCoefficients::design(
        band.filter_type(),
        sample_rate as f64,
        s.freq,
        s.q,
        s.gain_db,
    );
    debug_assert!(coeffs.is_stable(), "unstable {band:?} design: {coeffs:?}");
    coeffs
}

impl Effect for ToneFilter {
    fn kind(&self) -> EffectKind {
        EffectKind::Tone
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        TONE_PARAMS
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        find_spec(EffectKind::Tone, TONE_PARAMS, name)?;
        let (band, field) = split_name(name).ok_or_else(|| RigError::UnknownParameter {
            effect: EffectKind::Tone,
            name: name.to_string(),
        })?;
        let s = &self.settings[band.index()];
        Ok(match field {
            Field::Gain => s.gain_db,
            Field::Freq => s.freq,
            Field::Q => s.q,
        })
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = validate(EffectKind::Tone, TONE_PARAMS, name, value)?;
        let (band, field) = split_name(name).ok_or_else(|| RigError::UnknownParameter {
            effect: EffectKind::Tone,
            name: name.to_string(),
        })?;

        let max_freq = self.sample_rate as f64 * MAX_FREQ_RATIO;
        if field == Field::Freq && value >= max_freq {
            return Err(RigError::ParameterOutOfRange {
                effect: EffectKind::Tone,
                name: name.to_string(),
                value,
                min: spec.min,
                max: max_freq,
            });
        }

        let mut next = self.settings[band.index()];
        match field {
            Field::Gain => next.gain_db = value,
            Field::Freq => next.freq = value,
            Field::Q => next.q = value,
        }
        let coeffs = design(band, &next, self.sample_rate);
        self.settings[band.index()] = next;
        self.stages[band.index()].set_coefficients(coeffs);
        Ok(())
    }

    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let mut x = *sample as f64;
            for stage in self.stages.iter_mut() {
                x = stage.process(x);
            }
            *sample = x as f32;
        }
    }

    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::window::db_to_linear;
    use crate::dsp::effect::test_support::{SPLITS, test_signal, whole_and_split};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn flat_settings_pass_signal() {
        let mut tone = ToneFilter::new(44100).unwrap();
        let input = test_signal(8000, 44100);
        let out = tone.process(&input);
        for (a, b) in input.iter().zip(&out) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn bass_boost_raises_low_end() {
        let tone = ToneFilter::with_gains(44100, 12.0, 0.0, 0.0).unwrap();
        assert_approx_eq!(tone.magnitude_at(1.0), db_to_linear(12.0), 1e-2);
        assert_approx_eq!(tone.magnitude_at(15000.0), 1.0, 1e-2);
    }

    #[test]
    fn mid_cut_at_center() {
        let mut tone = ToneFilter::new(48000).unwrap();
        tone.set_parameter("mid_gain", -10.0).unwrap();
        tone.set_parameter("mid_freq", 1000.0).unwrap();
        tone.set_parameter("mid_q", 2.0).unwrap();
        assert_approx_eq!(tone.magnitude_at(1000.0), db_to_linear(-10.0), 2e-2);
    }

    #[test]
    fn frequency_at_nyquist_rejected() {
        let mut tone = ToneFilter::new(16000).unwrap();
        let before = tone.coefficients();
        let err = tone.set_parameter("treble_freq", 8000.0).unwrap_err();
        assert!(matches!(err, RigError::ParameterOutOfRange { max, .. } if (max - 7840.0).abs() < 1e-6));
        assert_eq!(tone.coefficients(), before);
        assert_eq!(tone.parameter("treble_freq").unwrap(), 3200.0);
        assert!(tone.set_parameter("treble_freq", 7000.0).is_ok());
    }

    #[test]
    fn defaults_clamped_for_low_sample_rates() {
        let tone = ToneFilter::new(4000).unwrap();
        // 3200 Hz halves to 980 Hz, below the treble band's 1000 Hz floor
        assert_eq!(tone.parameter("treble_freq").unwrap(), 1000.0);
        assert_eq!(tone.parameter("mid_freq").unwrap(), 800.0);
        assert!(tone.coefficients().iter().all(|c| c.is_stable()));

        // every value the filter reports must be accepted back
        let mut copy = ToneFilter::new(4000).unwrap();
        for spec in tone.parameters() {
            let value = tone.parameter(spec.name).unwrap();
            copy.set_parameter(spec.name, value).unwrap();
        }
        assert_eq!(copy.coefficients(), tone.coefficients());
    }

    #[test]
    fn sample_rate_too_low_for_bands_rejected() {
        // treble band starts at 1000 Hz, which needs 0.49 * sr > 1000
        assert_eq!(
            ToneFilter::new(2000).unwrap_err(),
            RigError::InvalidSampleRate(2000)
        );
        assert_eq!(ToneFilter::new(0).unwrap_err(), RigError::InvalidSampleRate(0));
        assert!(ToneFilter::new(2100).is_ok());
    }

    #[test]
    fn unknown_and_out_of_range_rejected() {
        let mut tone = ToneFilter::new(44100).unwrap();
        assert!(matches!(
            tone.set_parameter("presence_gain", 1.0),
            Err(RigError::UnknownParameter { .. })
        ));
        assert!(matches!(
            tone.set_parameter("mid_q", 0.0),
            Err(RigError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            tone.set_parameter("bass_gain", 20.0),
            Err(RigError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn output_bounded_across_parameter_grid() {
        let input: Vec<f32> = (0..12000)
            .map(|i| if (i / 37) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        for &gain in &[-15.0, 0.0, 15.0] {
            for &q in &[0.1, 1.0, 10.0] {
                for &(bass, mid, treble) in &[(20.0, 100.0, 1000.0), (1000.0, 8000.0, 20000.0)] {
                    let mut tone = ToneFilter::new(44100).unwrap();
                    for (name, value) in [
                        ("bass_gain", gain),
                        ("mid_gain", gain),
                        ("treble_gain", gain),
                        ("bass_q", q),
                        ("mid_q", q),
                        ("treble_q", q),
                        ("bass_freq", bass),
                        ("mid_freq", mid),
                        ("treble_freq", treble),
                    ] {
                        tone.set_parameter(name, value).unwrap();
                    }
                    let out = tone.process(&input);
                    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
                    assert!(
                        peak.is_finite() && peak < 1.0e4,
                        "gain={gain} q={q} freqs=({bass},{mid},{treble}) peak={peak}"
                    );
                }
            }
        }
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let first = test_signal(3000, 44100);
        let second: Vec<f32> = test_signal(3000, 44100).iter().rev().copied().collect();

        let mut used = ToneFilter::with_gains(44100, 6.0, -3.0, 9.0).unwrap();
        used.process(&first);
        used.reset();
        let a = used.process(&second);

        let mut fresh = ToneFilter::with_gains(44100, 6.0, -3.0, 9.0).unwrap();
        let b = fresh.process(&second);
        assert_eq!(a, b);
    }

    #[test]
    fn block_size_invariance() {
        let mut tone = ToneFilter::with_gains(44100, 9.0, -6.0, 4.0).unwrap();
        let input = test_signal(5000, 44100);
        let (whole, chunked) = whole_and_split(&mut tone, &input, &SPLITS);
        assert_eq!(whole, chunked);
    }
}
