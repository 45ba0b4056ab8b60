//! Response normalization.
//!
//! Backends return generic documents. Typed presentation is reconstructed per
//! hit by re-encoding the document and decoding it as an entity, trying the
//! entity kinds in a fixed precedence order. A hit no kind recognizes is
//! dropped; only the reduced count is visible to the caller.

use serde_json::Value as JsonValue;
use tracing::{debug, trace, warn};

use tacit_core::{
    collection_kind, Attachment, Candidate, CollectionKind, Document, FacetCount, Hit,
    SearchResponse,
};

/// Presentation entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Candidate,
    Attachment,
}

/// Order in which entity kinds are tried. The first recognizable one wins.
pub type Precedence = [EntityKind; 2];

pub const CANDIDATE_FIRST: Precedence = [EntityKind::Candidate, EntityKind::Attachment];
pub const ATTACHMENT_FIRST: Precedence = [EntityKind::Attachment, EntityKind::Candidate];

/// Precedence for a collection: its native entity first.
pub fn precedence_for(collection: &str) -> Precedence {
    match collection_kind(collection) {
        CollectionKind::Attachments => ATTACHMENT_FIRST,
        CollectionKind::Candidates | CollectionKind::Other => CANDIDATE_FIRST,
    }
}

/// A reconstructed hit.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Candidate(Candidate),
    Attachment(Attachment),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Candidate(_) => EntityKind::Candidate,
            Entity::Attachment(_) => EntityKind::Attachment,
        }
    }
}

/// Typed page of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPage {
    pub found: u64,
    pub page: u32,
    pub per_page: u32,
    /// Hits the backend returned before reconstruction.
    pub returned: usize,
    pub entities: Vec<Entity>,
}

impl EntityPage {
    /// Hits dropped because no entity kind recognized them.
    pub fn dropped(&self) -> usize {
        self.returned.saturating_sub(self.entities.len())
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Candidate(c) => Some(c),
            Entity::Attachment(_) => None,
        })
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Attachment(a) => Some(a),
            Entity::Candidate(_) => None,
        })
    }
}

/// Generic page keeping documents with their relevance metadata and facets.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub found: u64,
    pub page: u32,
    pub per_page: u32,
    pub documents: Vec<Hit>,
    pub facets: Vec<FacetCount>,
}

fn try_kind(encoded: &JsonValue, kind: EntityKind) -> Option<Entity> {
    match kind {
        EntityKind::Candidate => serde_json::from_value::<Candidate>(encoded.clone())
            .ok()
            .filter(Candidate::is_recognizable)
            .map(Entity::Candidate),
        EntityKind::Attachment => serde_json::from_value::<Attachment>(encoded.clone())
            .ok()
            .filter(Attachment::is_recognizable)
            .map(Entity::Attachment),
    }
}

/// Reconstruct one document, trying kinds in `precedence` order.
pub fn reconstruct(document: &Document, precedence: Precedence) -> Option<Entity> {
    let encoded = JsonValue::Object(document.clone());
    precedence.iter().find_map(|kind| try_kind(&encoded, *kind))
}

/// Reconstruct every hit into typed entities.
pub fn normalize_entities(response: SearchResponse, precedence: Precedence) -> EntityPage {
    let returned = response.hits.len();
    let entities: Vec<Entity> = response
        .hits
        .iter()
        .enumerate()
        .filter_map(|(idx, hit)| {
            let entity = reconstruct(&hit.document, precedence);
            match entity {
                Some(ref e) => trace!(hit = idx, kind = ?e.kind(), "Reconstructed hit"),
                None => trace!(hit = idx, "Dropped unrecognized hit"),
            }
            entity
        })
        .collect();

    let page = EntityPage {
        found: response.found,
        page: response.page,
        per_page: response.per_page,
        returned,
        entities,
    };

    if page.dropped() > 0 {
        warn!(
            result_count = page.entities.len(),
            dropped = page.dropped(),
            "Dropped hits no entity kind recognized"
        );
    } else {
        debug!(result_count = page.entities.len(), "Normalized hits");
    }

    page
}

/// Keep hits as generic documents with score, highlights and facets.
pub fn normalize_documents(response: SearchResponse) -> DocumentPage {
    DocumentPage {
        found: response.found,
        page: response.page,
        per_page: response.per_page,
        documents: response.hits,
        facets: response.facet_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_capture::CapturedLogs;
    use serde_json::json;

    fn hit(value: JsonValue) -> Hit {
        Hit::plain(value.as_object().unwrap().clone())
    }

    fn response(hits: Vec<Hit>) -> SearchResponse {
        SearchResponse {
            found: hits.len() as u64,
            page: 1,
            per_page: 10,
            hits,
            facet_counts: vec![],
        }
    }

    fn candidate_doc() -> JsonValue {
        json!({
            "id": "c1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "skills": "math, engines"
        })
    }

    fn attachment_doc() -> JsonValue {
        json!({
            "id": "a1",
            "name": "resume.pdf",
            "model_name": "candidates",
            "object_key": "attachments/a1.pdf",
            "record_id": "c1",
            "content": "Experienced engineer"
        })
    }

    #[test]
    fn test_mixed_hits_keep_their_entity_types() {
        let resp = response(vec![
            hit(candidate_doc()),
            hit(json!({"first_name": ["not", "a", "string"], "object_key": 7})),
            hit(attachment_doc()),
        ]);

        let page = normalize_entities(resp, CANDIDATE_FIRST);

        assert_eq!(page.returned, 3);
        assert_eq!(page.entities.len(), 2);
        assert_eq!(page.dropped(), 1);
        assert_eq!(page.candidates().count(), 1);
        assert_eq!(page.attachments().count(), 1);

        let candidate = page.candidates().next().unwrap();
        assert_eq!(candidate.first_name.as_deref(), Some("Ada"));
        assert_eq!(candidate.skills, vec!["math", "engines"]);

        let attachment = page.attachments().next().unwrap();
        assert_eq!(attachment.object_key.as_deref(), Some("attachments/a1.pdf"));
    }

    #[test]
    fn test_order_of_hits_is_preserved() {
        let resp = response(vec![hit(attachment_doc()), hit(candidate_doc())]);
        let page = normalize_entities(resp, CANDIDATE_FIRST);
        assert_eq!(page.entities[0].kind(), EntityKind::Attachment);
        assert_eq!(page.entities[1].kind(), EntityKind::Candidate);
    }

    #[test]
    fn test_ambiguous_hit_follows_precedence() {
        let both = json!({"first_name": "Ada", "record_id": "c1", "name": "notes.txt"});
        let doc = both.as_object().unwrap();

        assert_eq!(
            reconstruct(doc, CANDIDATE_FIRST).map(|e| e.kind()),
            Some(EntityKind::Candidate)
        );
        assert_eq!(
            reconstruct(doc, ATTACHMENT_FIRST).map(|e| e.kind()),
            Some(EntityKind::Attachment)
        );
    }

    #[test]
    fn test_primary_shape_failure_tries_secondary_shape() {
        // Structured `email` breaks the Candidate shape; the Attachment shape ignores it.
        let doc = json!({"email": {"primary": "x"}, "object_key": "k1", "record_id": "c9"});
        let entity = reconstruct(doc.as_object().unwrap(), CANDIDATE_FIRST);
        assert_eq!(entity.map(|e| e.kind()), Some(EntityKind::Attachment));
    }

    #[test]
    fn test_partial_drop_logs_warning() {
        let (logs, _guard) = CapturedLogs::install();
        let page = normalize_entities(
            response(vec![hit(candidate_doc()), hit(json!({"unrelated": true}))]),
            CANDIDATE_FIRST,
        );
        assert_eq!(page.dropped(), 1);

        let line = logs
            .line_with("Dropped hits no entity kind recognized")
            .expect("drop warning");
        assert!(line.contains("WARN"));
        assert!(line.contains("dropped=1"));
        assert!(line.contains("result_count=1"));
    }

    #[test]
    fn test_clean_page_logs_no_warning() {
        let (logs, _guard) = CapturedLogs::install();
        normalize_entities(response(vec![hit(candidate_doc())]), CANDIDATE_FIRST);
        assert!(!logs.contents().contains("WARN"));
    }

    #[test]
    fn test_empty_document_is_dropped() {
        let page = normalize_entities(response(vec![hit(json!({}))]), CANDIDATE_FIRST);
        assert!(page.entities.is_empty());
        assert_eq!(page.dropped(), 1);
    }

    #[test]
    fn test_precedence_for_collection() {
        assert_eq!(
            precedence_for("candidates_candidate-attachments"),
            ATTACHMENT_FIRST
        );
        assert_eq!(precedence_for("candidates_candidates"), CANDIDATE_FIRST);
    }

    #[test]
    fn test_documents_keep_metadata() {
        let mut h = hit(candidate_doc());
        h.text_match = Some(578730123365187705);
        let mut resp = response(vec![h]);
        resp.facet_counts = vec![FacetCount {
            field_name: "location".into(),
            counts: vec![],
        }];

        let page = normalize_documents(resp);
        assert_eq!(page.documents[0].text_match, Some(578730123365187705));
        assert_eq!(page.facets[0].field_name, "location");
    }
}
