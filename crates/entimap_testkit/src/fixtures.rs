//! Model fixtures for mapping tests.
//!
//! Provides ready-made persistable and embeddable types covering the
//! registration surface: direct and builder construction, wrapper
//! identifiers, embedded models in both layouts, collections, custom
//! converters, secondary indexes, and version properties.

use chrono::{DateTime, Utc};
use entimap_core::convert::downcast_host;
use entimap_core::{
    ConversionError, ConversionResult, Embeddable, EmbeddedDescriptor, EmbeddedField,
    EntityDescriptor, IdField, IdKind, IdentifierValue, LowercaseIndexer, ParentKeyField,
    Persistable, PropertyField, ValueConverter,
};
use entimap_value::{Key, KeyId, Value, ValueKind};
use std::any::Any;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A direct-construction model exercising scalars, collections, a
/// lowercased secondary index, and a version property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    /// Store-allocated numeric identity.
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Login email, secondary-indexed in lowercase under `$email`.
    pub email: String,
    /// Age in years.
    pub age: i32,
    /// Whether the account is enabled.
    pub active: bool,
    /// Free-form profile text, kept out of the indexes and skipped when
    /// unset.
    pub bio: Option<String>,
    /// Unordered role names.
    pub roles: HashSet<String>,
    /// Ordered bookmark labels.
    pub bookmarks: BTreeSet<String>,
    /// Recent login instants as epoch microseconds.
    pub logins: Vec<i64>,
    /// Optimistic-lock counter.
    pub revision: i64,
}

impl Persistable for User {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::direct::<User>("User")
            .id(IdField::new(|u: &User| u.id, |u: &mut User, id: i64| {
                u.id = Some(id);
            })
            .auto_generated())
            .field(PropertyField::new(
                "name",
                |u: &User| u.name.clone(),
                |u: &mut User, v: String| u.name = v,
            ))
            .field(
                PropertyField::new(
                    "email",
                    |u: &User| u.email.clone(),
                    |u: &mut User, v: String| u.email = v,
                )
                .secondary_index(Arc::new(LowercaseIndexer)),
            )
            .field(PropertyField::new(
                "age",
                |u: &User| u.age,
                |u: &mut User, v: i32| u.age = v,
            ))
            .field(PropertyField::new(
                "active",
                |u: &User| u.active,
                |u: &mut User, v: bool| u.active = v,
            ))
            .field(
                PropertyField::nullable(
                    "bio",
                    |u: &User| u.bio.clone(),
                    |u: &mut User, v: Option<String>| u.bio = v,
                )
                .unindexed()
                .optional(),
            )
            .field(PropertyField::new(
                "roles",
                |u: &User| u.roles.clone(),
                |u: &mut User, v: HashSet<String>| u.roles = v,
            ))
            .field(PropertyField::new(
                "bookmarks",
                |u: &User| u.bookmarks.clone(),
                |u: &mut User, v: BTreeSet<String>| u.bookmarks = v,
            ))
            .field(PropertyField::new(
                "logins",
                |u: &User| u.logins.clone(),
                |u: &mut User, v: Vec<i64>| u.logins = v,
            ))
            .field(PropertyField::new(
                "revision",
                |u: &User| u.revision,
                |u: &mut User, v: i64| u.revision = v,
            ))
            .version_property("revision")
    }
}

/// A builder-construction model with a text identity, a parent key, and
/// explicitly contracted properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    slug: String,
    parent: Option<Key>,
    balance: f64,
    opened_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account with the given identity.
    pub fn new(slug: impl Into<String>, balance: f64, opened_at: DateTime<Utc>) -> Self {
        Self {
            slug: slug.into(),
            parent: None,
            balance,
            opened_at,
        }
    }

    /// Places the account under an owning key.
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The text identity.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The owning key, if any.
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_ref()
    }

    /// The current balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// When the account was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Staged state for [`Account`] construction.
#[derive(Debug, Default)]
pub struct AccountBuilder {
    slug: Option<String>,
    parent: Option<Key>,
    balance: f64,
    opened_at: DateTime<Utc>,
}

impl AccountBuilder {
    /// Finishes the build, substituting an empty slug when the stored key
    /// carried none.
    pub fn build(self) -> Account {
        Account {
            slug: self.slug.unwrap_or_default(),
            parent: self.parent,
            balance: self.balance,
            opened_at: self.opened_at,
        }
    }
}

impl Persistable for Account {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::with_builder::<Account, AccountBuilder, _, _>(
            "Account",
            AccountBuilder::default,
            AccountBuilder::build,
        )
        .id(IdField::new(
            |a: &Account| Some(a.slug.clone()),
            |b: &mut AccountBuilder, slug: String| b.slug = Some(slug),
        ))
        .parent_key(ParentKeyField::new(
            |a: &Account| a.parent.clone(),
            |b: &mut AccountBuilder, key: Key| b.parent = Some(key),
        ))
        .property(PropertyField::new(
            "balance",
            |a: &Account| a.balance,
            |b: &mut AccountBuilder, v: f64| b.balance = v,
        ))
        .property(PropertyField::new(
            "opened_at",
            |a: &Account| a.opened_at,
            |b: &mut AccountBuilder, v: DateTime<Utc>| b.opened_at = v,
        ))
    }
}

/// Newtype order identity backed by a store-allocated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderId(i64);

impl OrderId {
    /// Wraps a raw identity.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw identity.
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl IdentifierValue for OrderId {
    const KIND: IdKind = IdKind::Numeric;

    fn from_key_id(id: &KeyId) -> ConversionResult<Self> {
        i64::from_key_id(id).map(OrderId)
    }

    fn to_key_id(&self) -> KeyId {
        self.0.to_key_id()
    }
}

/// Converter storing a `u8` percentage as a native integer, refusing
/// stored values outside `0..=100`.
#[derive(Debug, Clone, Copy)]
pub struct PercentConverter;

impl ValueConverter for PercentConverter {
    fn native_kind(&self) -> ValueKind {
        ValueKind::Integer
    }

    fn host_type(&self) -> &'static str {
        "u8"
    }

    fn encode(&self, host: &dyn Any) -> ConversionResult<Value> {
        let percent = downcast_host::<u8>(host)?;
        Ok(Value::Integer(i64::from(*percent)))
    }

    fn decode(&self, native: &Value) -> ConversionResult<Box<dyn Any>> {
        let Value::Integer(n) = native else {
            return Err(ConversionError::unexpected_kind(
                ValueKind::Integer,
                native.kind(),
            ));
        };
        if !(0..=100).contains(n) {
            return Err(ConversionError::out_of_range(*n, "u8 percentage"));
        }
        Ok(Box::new(*n as u8))
    }
}

/// A model with a wrapper identifier and a custom range-checked converter
/// on one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    /// Assigned order number.
    pub id: Option<OrderId>,
    /// Completion percentage, stored through [`PercentConverter`].
    pub progress: u8,
    /// Line item labels.
    pub items: Vec<String>,
}

impl Persistable for Order {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::direct::<Order>("Order")
            .id(
                IdField::new(|o: &Order| o.id, |o: &mut Order, id: OrderId| {
                    o.id = Some(id);
                })
                .auto_generated(),
            )
            .field(
                PropertyField::new(
                    "progress",
                    |o: &Order| o.progress,
                    |o: &mut Order, v: u8| o.progress = v,
                )
                .with_converter(Arc::new(PercentConverter)),
            )
            .field(PropertyField::new(
                "items",
                |o: &Order| o.items.clone(),
                |o: &mut Order, v: Vec<String>| o.items = v,
            ))
    }
}

/// Coordinates nested inside [`Address`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoPoint {
    /// Degrees latitude.
    pub lat: f64,
    /// Degrees longitude.
    pub lng: f64,
}

impl Embeddable for GeoPoint {
    fn descriptor() -> EmbeddedDescriptor {
        EmbeddedDescriptor::direct::<GeoPoint>()
            .field(PropertyField::new(
                "lat",
                |g: &GeoPoint| g.lat,
                |g: &mut GeoPoint, v: f64| g.lat = v,
            ))
            .field(PropertyField::new(
                "lng",
                |g: &GeoPoint| g.lng,
                |g: &mut GeoPoint, v: f64| g.lng = v,
            ))
    }
}

/// A postal address with nested coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City name.
    pub city: String,
    /// Postal code.
    pub zip: String,
    /// Geocoded position, laid out as one nested entity.
    pub geo: GeoPoint,
}

impl Embeddable for Address {
    fn descriptor() -> EmbeddedDescriptor {
        EmbeddedDescriptor::direct::<Address>()
            .field(PropertyField::new(
                "street",
                |a: &Address| a.street.clone(),
                |a: &mut Address, v: String| a.street = v,
            ))
            .field(PropertyField::new(
                "city",
                |a: &Address| a.city.clone(),
                |a: &mut Address, v: String| a.city = v,
            ))
            .field(PropertyField::new(
                "zip",
                |a: &Address| a.zip.clone(),
                |a: &mut Address, v: String| a.zip = v,
            ))
            .embedded(
                EmbeddedField::new(
                    "geo",
                    |a: &Address| a.geo,
                    |a: &mut Address, v: GeoPoint| a.geo = v,
                )
                .imploded(),
            )
    }
}

/// A model carrying the same embedded type in both layouts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    /// Store-allocated numeric identity.
    pub id: Option<i64>,
    /// Customer name.
    pub name: String,
    /// Primary address, flattened into the customer entity.
    pub home: Address,
    /// Secondary address, stored as one nested entity when present.
    pub office: Option<Address>,
}

impl Persistable for Customer {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::direct::<Customer>("Customer")
            .id(
                IdField::new(|c: &Customer| c.id, |c: &mut Customer, id: i64| {
                    c.id = Some(id);
                })
                .auto_generated(),
            )
            .field(PropertyField::new(
                "name",
                |c: &Customer| c.name.clone(),
                |c: &mut Customer, v: String| c.name = v,
            ))
            .embedded(EmbeddedField::new(
                "home",
                |c: &Customer| c.home.clone(),
                |c: &mut Customer, v: Address| c.home = v,
            ))
            .embedded(
                EmbeddedField::nullable(
                    "office",
                    |c: &Customer| c.office.clone(),
                    |c: &mut Customer, v: Option<Address>| c.office = v,
                )
                .imploded(),
            )
    }
}

/// Ready-made instances for mapping scenarios.
pub mod scenarios {
    use super::*;

    /// A fully populated [`User`] with a stable identity.
    ///
    /// The single-element role set keeps the marshalled shape
    /// deterministic.
    pub fn sample_user() -> User {
        User {
            id: Some(7),
            name: "Ada Lovelace".to_string(),
            email: "Ada@Example.com".to_string(),
            age: 36,
            active: true,
            bio: None,
            roles: HashSet::from(["admin".to_string()]),
            bookmarks: BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()]),
            logins: vec![1_700_000_000_000_000, 1_700_000_100_000_000],
            revision: 3,
        }
    }

    /// An [`Account`] parented under a numeric `User` key.
    pub fn sample_account() -> Account {
        let opened_at = DateTime::from_timestamp_micros(1_700_000_000_000_000)
            .expect("In-range timestamp");
        Account::new("acct-primary", 250.75, opened_at).with_parent(Key::numeric("User", 7))
    }

    /// A [`Customer`] with both address layouts populated.
    pub fn sample_customer() -> Customer {
        Customer {
            id: Some(11),
            name: "Grace".to_string(),
            home: Address {
                street: "1 Infinite Loop".to_string(),
                city: "Cupertino".to_string(),
                zip: "95014".to_string(),
                geo: GeoPoint {
                    lat: 37.33,
                    lng: -122.03,
                },
            },
            office: Some(Address {
                street: "500 Oracle Pkwy".to_string(),
                city: "Redwood City".to_string(),
                zip: "94065".to_string(),
                geo: GeoPoint {
                    lat: 37.53,
                    lng: -122.26,
                },
            }),
        }
    }

    /// An [`Order`] mid-progress.
    pub fn sample_order() -> Order {
        Order {
            id: Some(OrderId::new(401)),
            progress: 64,
            items: vec!["widget".to_string(), "gadget".to_string()],
        }
    }
}
