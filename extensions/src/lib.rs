//! Integrations backing the Askplot collaborator traits: Gemini for embeddings and answer
//! generation, Firestore for the stored plot vectors.

pub mod firestore;
pub mod gemini;
