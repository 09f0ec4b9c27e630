use std::collections::BTreeMap;

use bytes::Bytes;
use lopdf::{Document, Object, ObjectId};

use crate::types::MergeError;

/// Concatenate rendered page documents, in ascending ordinal order, into one
/// document.
///
/// Each input buffer is a complete PDF; their page trees are spliced under a
/// single `Pages` root after renumbering object ids so they cannot collide.
/// Any failure here is fatal to the whole request: a merge error discards
/// the session output even when individual pages rendered fine.
pub fn merge_documents(buffers: &[Bytes]) -> Result<Vec<u8>, MergeError> {
    if buffers.is_empty() {
        return Err(MergeError::NoDocuments);
    }

    let mut max_id = 1u32;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (ordinal, buffer) in buffers.iter().enumerate() {
        let mut doc = Document::load_mem(buffer).map_err(|err| MergeError::Load {
            ordinal,
            message: err.to_string(),
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration preserves the
        // document's own page order.
        for (_, page_id) in doc.get_pages() {
            let object = doc
                .get_object(page_id)
                .map_err(|err| MergeError::Load {
                    ordinal,
                    message: err.to_string(),
                })?
                .to_owned();
            page_objects.push((page_id, object));
        }
        all_objects.append(&mut doc.objects);
    }

    let mut document = Document::with_version("1.5");
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in all_objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                // First catalog wins; later ones are duplicates.
                catalog_object = Some((
                    match catalog_object {
                        Some((id, _)) => id,
                        None => object_id,
                    },
                    object,
                ));
            }
            b"Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing_dict) = existing.as_dict() {
                            dictionary.extend(existing_dict);
                        }
                    }
                    pages_object = Some((
                        match pages_object {
                            Some((id, _)) => id,
                            None => object_id,
                        },
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            // Pages are re-parented below; outlines are dropped.
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                document.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, pages_root) =
        pages_object.ok_or_else(|| MergeError::PageTree("no Pages root found".to_string()))?;
    let (catalog_id, catalog_root) =
        catalog_object.ok_or_else(|| MergeError::PageTree("no Catalog found".to_string()))?;

    for (page_id, object) in &page_objects {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            document
                .objects
                .insert(*page_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", page_objects.len() as u32);
        dictionary.set(
            "Kids",
            page_objects
                .iter()
                .map(|(page_id, _)| Object::Reference(*page_id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();

    let mut out = Vec::new();
    document
        .save_to(&mut out)
        .map_err(|err| MergeError::Write(err.to_string()))?;
    Ok(out)
}
