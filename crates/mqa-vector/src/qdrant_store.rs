//! Qdrant implementation for vector storage
//!
//! Connection management and vector operations for document chunk
//! embeddings: collection setup, batch upsert, similarity search, and
//! deletion by point ID or document.

use async_trait::async_trait;
use mqa_core::{DatabaseConfig, MqaError, Result, RetrievedChunk};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId, PointStruct, PointsIdsList,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ChunkPoint, CollectionStats, VectorStore};

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Create a new Qdrant connection
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| MqaError::VectorStore(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.qdrant_collection.clone(),
            dimension: config.vector_dimension,
        })
    }
}

/// Payload stored with each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorPayload {
    document_id: String,
    chunk_index: u32,
    page_number: u32,
    content: String,
    filename: String,
}

impl From<&ChunkPoint> for VectorPayload {
    fn from(point: &ChunkPoint) -> Self {
        Self {
            document_id: point.document_id.to_string(),
            chunk_index: point.chunk_index,
            page_number: point.page_number,
            content: point.content.clone(),
            filename: point.filename.clone(),
        }
    }
}

fn payload_map(
    payload: &VectorPayload,
) -> std::collections::HashMap<String, qdrant_client::qdrant::Value> {
    serde_json::to_value(payload)
        .unwrap_or_default()
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect()
}

/// Extract the point ID as the UUID string it was stored with
fn point_id_string(id: Option<PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;

    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| MqaError::VectorStore(format!("Failed to list collections: {e}")))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| {
                    MqaError::VectorStore(format!("Failed to create collection: {e}"))
                })?;

            tracing::info!(collection = %self.collection, "created vector collection");
        }

        Ok(())
    }

    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let qdrant_points: Vec<PointStruct> = points
            .iter()
            .map(|point| {
                let payload = payload_map(&VectorPayload::from(point));
                PointStruct::new(point.id.to_string(), point.vector.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, qdrant_points))
            .await
            .map_err(|e| MqaError::VectorStore(format!("Failed to upsert vectors: {e}")))?;

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| MqaError::VectorStore(format!("Vector search failed: {e}")))?;

        let retrieved: Vec<RetrievedChunk> = results
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;

                let content = payload
                    .get("content")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let filename = payload
                    .get("filename")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let document_id = payload
                    .get("document_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .unwrap_or_default();

                let chunk_index = payload
                    .get("chunk_index")
                    .and_then(|v| v.as_integer())
                    .unwrap_or(0) as u32;

                let page_number = payload
                    .get("page_number")
                    .and_then(|v| v.as_integer())
                    .unwrap_or(0) as u32;

                RetrievedChunk {
                    embedding_id: point_id_string(point.id),
                    score: point.score,
                    content,
                    chunk_index,
                    page_number,
                    document_id,
                    filename,
                }
            })
            .collect();

        Ok(retrieved)
    }

    async fn delete_points(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| PointId::from(id.clone())).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids: point_ids }),
            )
            .await
            .map_err(|e| MqaError::VectorStore(format!("Failed to delete vectors: {e}")))?;

        Ok(())
    }

    async fn collection_stats(&self) -> Result<CollectionStats> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| MqaError::VectorStore(format!("Failed to get collection info: {e}")))?;

        let points_count = info
            .result
            .and_then(|info| info.points_count)
            .unwrap_or_default();

        Ok(CollectionStats {
            name: self.collection.clone(),
            points_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let point = ChunkPoint {
            id: Uuid::new_v4(),
            vector: vec![0.1, 0.2],
            document_id: Uuid::new_v4(),
            chunk_index: 4,
            page_number: 9,
            content: "Turn the CUTOFF knob.".to_string(),
            filename: "manual.pdf".to_string(),
        };

        let payload = VectorPayload::from(&point);
        assert_eq!(payload.chunk_index, 4);
        assert_eq!(payload.page_number, 9);

        let map = payload_map(&payload);
        assert!(map.contains_key("content"));
        assert!(map.contains_key("document_id"));
        assert!(map.contains_key("filename"));
    }

    #[test]
    fn test_point_id_string() {
        use qdrant_client::qdrant::point_id::PointIdOptions;

        let uuid = Uuid::new_v4().to_string();
        let id = PointId {
            point_id_options: Some(PointIdOptions::Uuid(uuid.clone())),
        };
        assert_eq!(point_id_string(Some(id)), uuid);

        let id = PointId {
            point_id_options: Some(PointIdOptions::Num(7)),
        };
        assert_eq!(point_id_string(Some(id)), "7");

        assert_eq!(point_id_string(None), "");
    }
}
