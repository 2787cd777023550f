use super::evaluate::{Evaluator, EvaluatorError};
use crate::game::{Color, Piece, Position};
use crate::utils::SQUARE_COUNT;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Hand kinds as seen by the network; the king slot is always empty.
const HAND_SLOTS: [Piece; 6] = [
    Piece::Gold,
    Piece::King,
    Piece::Pawn,
    Piece::Silver,
    Piece::Bishop,
    Piece::Rook,
];

pub const FEATURE_COUNT: usize = SQUARE_COUNT + 2 * HAND_SLOTS.len() + 1;

const PIECE_SCALE: f32 = 1.0 / 30.0;
const HAND_SCALE: f32 = 0.5;
const SIDE_SCALE: f32 = 1.0;

static LOADED_NETWORK: OnceLock<Network> = OnceLock::new();

/// Input vector: piece codes per square, both hands, then the side to move.
pub fn encode_features(position: &Position) -> [f32; FEATURE_COUNT] {
    let mut features = [0.0; FEATURE_COUNT];

    for (square, entry) in position.pieces.iter().enumerate() {
        if let Some((piece, color)) = entry {
            features[square] = piece.feature_code(*color) as f32 * PIECE_SCALE;
        }
    }

    for (color_index, hand) in position.hands.iter().enumerate() {
        for (slot, piece) in HAND_SLOTS.iter().enumerate() {
            if *piece == Piece::King {
                continue;
            }

            features[SQUARE_COUNT + color_index * HAND_SLOTS.len() + slot] =
                hand.count(*piece) as f32 * HAND_SCALE;
        }
    }

    features[FEATURE_COUNT - 1] = match position.side {
        Color::Black => 0.0,
        Color::White => SIDE_SCALE,
    };

    features
}

#[derive(Clone, Debug)]
pub struct Layer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f32>, // row major, `outputs` rows of `inputs`
    biases: Vec<f32>,
}

impl Layer {
    pub fn new(
        inputs: usize,
        outputs: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self, EvaluatorError> {
        if inputs == 0 || weights.len() != inputs * outputs || biases.len() != outputs {
            return Err(EvaluatorError::Malformed(format!(
                "layer {}x{} has {} weights and {} biases",
                inputs,
                outputs,
                weights.len(),
                biases.len()
            )));
        }

        Ok(Self {
            inputs,
            outputs,
            weights,
            biases,
        })
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .chunks_exact(self.inputs)
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect()
    }
}

/// Dense network with ReLU hidden layers and a sigmoid output.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Result<Self, EvaluatorError> {
        let malformed = |reason: String| Err(EvaluatorError::Malformed(reason));

        let (Some(first), Some(last)) = (layers.first(), layers.last()) else {
            return malformed("no layers".to_string());
        };

        if first.inputs != FEATURE_COUNT {
            return malformed(format!("expected {} inputs, got {}", FEATURE_COUNT, first.inputs));
        }

        if last.outputs != 1 {
            return malformed(format!("expected a single output, got {}", last.outputs));
        }

        for pair in layers.windows(2) {
            if pair[0].outputs != pair[1].inputs {
                return malformed(format!(
                    "layer output {} does not feed input {}",
                    pair[0].outputs, pair[1].inputs
                ));
            }
        }

        Ok(Self { layers })
    }

    /// Little-endian: u32 layer count, then per layer u32 inputs, u32 outputs,
    /// the weights and the biases as f32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EvaluatorError> {
        let mut reader = ByteReader { bytes, offset: 0 };

        let layer_count = reader.read_u32()? as usize;
        let mut layers = Vec::new();

        for _ in 0..layer_count {
            let inputs = reader.read_u32()? as usize;
            let outputs = reader.read_u32()? as usize;

            let weights = reader.read_f32s(inputs * outputs)?;
            let biases = reader.read_f32s(outputs)?;

            layers.push(Layer::new(inputs, outputs, weights, biases)?);
        }

        if reader.offset != bytes.len() {
            return Err(EvaluatorError::Malformed(format!(
                "{} trailing bytes",
                bytes.len() - reader.offset
            )));
        }

        Self::new(layers)
    }

    pub fn from_file(path: &Path) -> Result<Self, EvaluatorError> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn forward(&self, features: &[f32]) -> f32 {
        let mut activations = features.to_vec();

        for (index, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);

            if index + 1 < self.layers.len() {
                activations.iter_mut().for_each(|x| *x = x.max(0.0));
            }
        }

        1.0 / (1.0 + (-activations[0]).exp())
    }
}

impl Evaluator for Network {
    fn evaluate(&self, position: &Position) -> Result<f64, EvaluatorError> {
        let output = self.forward(&encode_features(position));

        if !output.is_finite() {
            return Err(EvaluatorError::Malformed(format!("network produced {}", output)));
        }

        Ok(output as f64)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl ByteReader<'_> {
    fn read_word(&mut self) -> Result<[u8; 4], EvaluatorError> {
        let word = self
            .bytes
            .get(self.offset..self.offset + 4)
            .ok_or_else(|| EvaluatorError::Malformed("truncated file".to_string()))?;
        self.offset += 4;

        Ok([word[0], word[1], word[2], word[3]])
    }

    fn read_u32(&mut self) -> Result<u32, EvaluatorError> {
        Ok(u32::from_le_bytes(self.read_word()?))
    }

    fn read_f32s(&mut self, count: usize) -> Result<Vec<f32>, EvaluatorError> {
        (0..count)
            .map(|_| Ok(f32::from_le_bytes(self.read_word()?)))
            .collect()
    }
}

/// Loads the process-wide network. Must happen before any search starts.
pub fn load_network_from_file(path: &Path) -> Result<(), EvaluatorError> {
    let network = Network::from_file(path)?;

    LOADED_NETWORK
        .set(network)
        .map_err(|_| EvaluatorError::Malformed("a network is already loaded".to_string()))?;

    log::info!("Loaded network from {}", path.display());

    Ok(())
}

pub fn get_network() -> Option<&'static Network> {
    LOADED_NETWORK.get()
}

/// Evaluates with the process-wide network, failing until one is loaded.
pub struct NetworkEvaluator;

impl Evaluator for NetworkEvaluator {
    fn evaluate(&self, position: &Position) -> Result<f64, EvaluatorError> {
        get_network()
            .ok_or(EvaluatorError::NotLoaded)?
            .evaluate(position)
    }
}
