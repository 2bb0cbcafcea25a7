use crate::container::DataContainer;
use crate::tag::TypeTag;
use crate::value::GeoValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Converts a payload while it crosses a link between differently-tagged
/// ports.
pub type Converter = Arc<dyn Fn(&GeoValue) -> GeoValue + Send + Sync>;

/// Declares which (producer tag, consumer tag) pairs may be linked.
///
/// Exact tag equality is always compatible. A declared row without a
/// converter marks the pair as directly connectable; a row with a converter
/// additionally rewrites the payload during input propagation. Querying an
/// undeclared pair returns `false`, never an error; link creation turns
/// that into a connection rejection.
pub struct CompatibilityTable {
    rows: HashMap<(TypeTag, TypeTag), Option<Converter>>,
}

impl CompatibilityTable {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// The conversions the standard block library relies on: sequences and
    /// vertex-keyed fields interconvert (sequence index becomes the vertex
    /// id and vice versa), and integers widen to reals.
    pub fn standard() -> Self {
        let mut table = Self::new();

        table.declare(
            TypeTag::coords(),
            TypeTag::coord_field(),
            Some(Arc::new(|v| match v {
                GeoValue::Coords(c) => GeoValue::CoordField(
                    c.iter().enumerate().map(|(i, p)| (i as u64, *p)).collect(),
                ),
                other => other.clone(),
            })),
        );
        table.declare(
            TypeTag::coord_field(),
            TypeTag::coords(),
            Some(Arc::new(|v| match v {
                GeoValue::CoordField(f) => GeoValue::Coords(f.values().copied().collect()),
                other => other.clone(),
            })),
        );
        table.declare(
            TypeTag::scalars(),
            TypeTag::scalar_field(),
            Some(Arc::new(|v| match v {
                GeoValue::Scalars(s) => GeoValue::ScalarField(
                    s.iter().enumerate().map(|(i, x)| (i as u64, *x)).collect(),
                ),
                other => other.clone(),
            })),
        );
        table.declare(
            TypeTag::scalar_field(),
            TypeTag::scalars(),
            Some(Arc::new(|v| match v {
                GeoValue::ScalarField(f) => GeoValue::Scalars(f.values().copied().collect()),
                other => other.clone(),
            })),
        );
        table.declare(
            TypeTag::int(),
            TypeTag::real(),
            Some(Arc::new(|v| match v {
                GeoValue::Int(n) => GeoValue::Real(*n as f64),
                other => other.clone(),
            })),
        );

        table
    }

    pub fn declare(&mut self, producer: TypeTag, consumer: TypeTag, converter: Option<Converter>) {
        self.rows.insert((producer, consumer), converter);
    }

    pub fn is_compatible(&self, producer: TypeTag, consumer: TypeTag) -> bool {
        producer == consumer || self.rows.contains_key(&(producer, consumer))
    }

    /// Moves a published container across a link to a consumer port,
    /// applying the declared converter where the tags differ. Returns
    /// `None` for undeclared pairs.
    pub fn convert(&self, container: &DataContainer, consumer: TypeTag) -> Option<DataContainer> {
        if container.tag() == consumer {
            return Some(container.clone());
        }
        match self.rows.get(&(container.tag(), consumer))? {
            Some(converter) => Some(DataContainer::store(converter(container.value()))),
            None => Some(container.clone()),
        }
    }
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::standard()
    }
}
