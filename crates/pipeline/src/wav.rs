//! In-memory WAV container framing

use std::io::Cursor;

use crate::PipelineError;
use call_agent_core::SpeechSegment;

/// Package a segment's PCM into a self-contained mono 16-bit WAV blob
pub fn encode_segment(segment: &SpeechSegment) -> Result<Vec<u8>, PipelineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: segment.sample_rate().as_hz(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| PipelineError::Audio(e.to_string()))?;
        for sample in segment.samples() {
            writer
                .write_sample(sample)
                .map_err(|e| PipelineError::Audio(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| PipelineError::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV blob into mono 16-bit samples and its sample rate
pub fn decode(bytes: &[u8]) -> Result<(Vec<i16>, u32), PipelineError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Audio(e.to_string()))?;
    let sample_rate = reader.spec().sample_rate;

    let samples: Result<Vec<i16>, _> = match reader.spec().sample_format {
        hound::SampleFormat::Int => reader.into_samples::<i16>().collect(),
        hound::SampleFormat::Float => {
            return Err(PipelineError::Audio("float WAV not supported".to_string()))
        }
    };

    let samples = samples.map_err(|e| PipelineError::Audio(e.to_string()))?;
    Ok((samples, sample_rate))
}
