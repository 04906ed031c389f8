/// Format a frequency value with appropriate unit suffix (Hz, kHz)
pub fn format_frequency(freq: f64) -> String {
    if freq >= 1000.0 {
        format!("{:.2} kHz", freq / 1000.0)
    } else {
        format!("{:.1} Hz", freq)
    }
}

/// Format a time value with appropriate unit suffix (ms, s)
pub fn format_time(time_in_seconds: f64) -> String {
    if time_in_seconds >= 1.0 {
        format!("{:.2} s", time_in_seconds)
    } else {
        format!("{:.0} ms", time_in_seconds * 1000.0)
    }
}

/// Convert a decibel difference to a power ratio (10 dB per decade)
pub fn db_to_power_ratio(db: f64) -> f64 {
    10.0f64.powf(db / 10.0)
}

/// Decode little-endian 16-bit PCM, ignoring a trailing odd byte
pub fn decode_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(format_frequency(440.0), "440.0 Hz");
        assert_eq!(format_frequency(1760.0), "1.76 kHz");
        assert_eq!(format_time(0.25), "250 ms");
        assert_eq!(format_time(1.5), "1.50 s");
    }

    #[test]
    fn power_ratio() {
        assert_eq!(db_to_power_ratio(0.0), 1.0);
        assert!((db_to_power_ratio(-10.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn decode_ignores_odd_tail() {
        assert_eq!(decode_pcm16(&[0x01, 0x00, 0xff, 0xff, 0x07]), vec![1, -1]);
    }
}
