//! The default disseminator bound to the configured system service id.
//!
//! Every object carries these methods whatever its content models declare.
//! None of them takes parameters.

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::DisseminationError;
use crate::model::{
    ControlGroup, Datastream, MethodDefinition, MimeTypedStream, ObjectMethods, ObjectState,
};
use crate::params::ResolvedParameters;
use crate::registry::{DynamicContext, DynamicService};

/// Object profile method.
pub const VIEW_OBJECT_PROFILE: &str = "viewObjectProfile";
/// Datastream listing method.
pub const VIEW_ITEM_INDEX: &str = "viewItemIndex";
/// Method listing method.
pub const VIEW_METHOD_INDEX: &str = "viewMethodIndex";
/// Dublin Core record method.
pub const VIEW_DUBLIN_CORE: &str = "viewDublinCore";

/// Datastream holding the Dublin Core record.
pub const DUBLIN_CORE_DATASTREAM: &str = "DC";

const JSON_MIME: &str = "application/json";
const XML_MIME: &str = "text/xml";

/// Built-in handler describing an object.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDisseminator;

impl DynamicService for DefaultDisseminator {
    fn methods(&self) -> Vec<MethodDefinition> {
        [
            VIEW_OBJECT_PROFILE,
            VIEW_ITEM_INDEX,
            VIEW_METHOD_INDEX,
            VIEW_DUBLIN_CORE,
        ]
        .into_iter()
        .map(MethodDefinition::new)
        .collect()
    }

    fn invoke(
        &self,
        method: &str,
        _parameters: &ResolvedParameters,
        context: &DynamicContext<'_>,
    ) -> Result<MimeTypedStream, DisseminationError> {
        match method {
            VIEW_OBJECT_PROFILE => json_stream(&ObjectProfile::from_context(context)),
            VIEW_ITEM_INDEX => json_stream(&ItemIndex::from_context(context)),
            VIEW_METHOD_INDEX => {
                let methods = context.methods.list_methods(
                    context.request,
                    &context.object.pid,
                    context.as_of,
                )?;
                json_stream(&MethodIndexView {
                    pid: &context.object.pid,
                    as_of: context.as_of,
                    methods,
                })
            }
            VIEW_DUBLIN_CORE => dublin_core(context),
            other => Err(DisseminationError::dynamic_method_not_found(
                "default disseminator",
                other,
            )),
        }
    }
}

#[derive(Serialize)]
struct ObjectProfile<'a> {
    pid: &'a str,
    label: &'a str,
    state: ObjectState,
    owner_id: Option<&'a str>,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    last_modified: OffsetDateTime,
    content_models: &'a [String],
    #[serde(with = "time::serde::rfc3339::option")]
    as_of: Option<OffsetDateTime>,
}

impl<'a> ObjectProfile<'a> {
    fn from_context(context: &DynamicContext<'a>) -> Self {
        let object = context.object;
        Self {
            pid: &object.pid,
            label: &object.label,
            state: object.state,
            owner_id: object.owner_id.as_deref(),
            created: object.created,
            last_modified: object.last_modified,
            content_models: &object.content_models,
            as_of: context.as_of,
        }
    }
}

#[derive(Serialize)]
struct ItemIndex<'a> {
    pid: &'a str,
    #[serde(with = "time::serde::rfc3339::option")]
    as_of: Option<OffsetDateTime>,
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct Item<'a> {
    id: &'a str,
    label: &'a str,
    mime_type: &'a str,
    control_group: ControlGroup,
    state: ObjectState,
}

impl<'a> From<&'a Datastream> for Item<'a> {
    fn from(ds: &'a Datastream) -> Self {
        Self {
            id: &ds.id,
            label: &ds.label,
            mime_type: &ds.mime_type,
            control_group: ds.control_group,
            state: ds.state,
        }
    }
}

impl<'a> ItemIndex<'a> {
    fn from_context(context: &DynamicContext<'a>) -> Self {
        Self {
            pid: &context.object.pid,
            as_of: context.as_of,
            items: context.object.datastreams.iter().map(Item::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct MethodIndexView<'a> {
    pid: &'a str,
    #[serde(with = "time::serde::rfc3339::option")]
    as_of: Option<OffsetDateTime>,
    methods: Vec<ObjectMethods>,
}

fn json_stream(value: &impl Serialize) -> Result<MimeTypedStream, DisseminationError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(DisseminationError::EncodeOutput)?;
    Ok(MimeTypedStream::from_bytes(JSON_MIME, bytes))
}

fn dublin_core(context: &DynamicContext<'_>) -> Result<MimeTypedStream, DisseminationError> {
    let pid = &context.object.pid;
    let content = context
        .reader
        .datastream_content(pid, DUBLIN_CORE_DATASTREAM, context.as_of)?
        .ok_or_else(|| DisseminationError::DatastreamNotFound {
            pid: pid.clone(),
            datastream: DUBLIN_CORE_DATASTREAM.to_owned(),
        })?;
    Ok(MimeTypedStream::from_bytes(XML_MIME, content))
}
