//! WAV reading and writing for [`PcmBuffer`]s.

use std::path::Path;

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use timbre_core::PcmBuffer;

/// Read a WAV file of any channel count, scaled to `[-1, 1]`.
pub fn read_wav(path: &Path) -> anyhow::Result<PcmBuffer> {
    let reader = WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    PcmBuffer::from_interleaved(&samples, usize::from(spec.channels), spec.sample_rate as f32)
        .with_context(|| format!("decoding {}", path.display()))
}

/// Write `buffer` as interleaved PCM; 32 bits means IEEE float.
pub fn write_wav(path: &Path, buffer: &PcmBuffer, bits_per_sample: u16) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate().round() as u32,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;

    let max_val = (1i64 << (bits_per_sample - 1)) as f32;
    for i in 0..buffer.len() {
        for channel in buffer.channels() {
            let sample = channel[i];
            if bits_per_sample == 32 {
                writer.write_sample(sample)?;
            } else {
                writer.write_sample((sample * max_val).clamp(-max_val, max_val - 1.0) as i32)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_round_trip_keeps_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.wav");
        let input =
            PcmBuffer::stereo(vec![0.5, -0.25, 0.0], vec![-0.5, 0.25, 0.125], 48000.0).unwrap();
        write_wav(&path, &input, 32).unwrap();
        assert_eq!(read_wav(&path).unwrap(), input);
    }

    #[test]
    fn sixteen_bit_is_quantized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let input = PcmBuffer::mono(vec![0.5, -1.0, 1.0], 44100.0).unwrap();
        write_wav(&path, &input, 16).unwrap();
        let back = read_wav(&path).unwrap();
        let samples = back.channel(0).unwrap();
        assert!((samples[0] - 0.5).abs() < 1e-4);
        assert_eq!(samples[1], -1.0);
        assert!(samples[2] < 1.0 && samples[2] > 0.999);
    }
}
