use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt::{self, Formatter};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use crate::{Guard, HashSet, HashSetRef};

struct SetVisitor<T, S> {
    _marker: PhantomData<HashSet<T, S>>,
}

impl<T, S, G> Serialize for HashSetRef<'_, T, S, G>
where
    T: Serialize + Hash + Eq,
    G: Guard,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_seq(self)
    }
}

impl<T, S> Serialize for HashSet<T, S>
where
    T: Serialize + Hash + Eq,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        self.pin().serialize(serializer)
    }
}

impl<'de, T, S> Deserialize<'de> for HashSet<T, S>
where
    T: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(SetVisitor::new())
    }
}

impl<T, S> SetVisitor<T, S> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, T, S> Visitor<'de> for SetVisitor<T, S>
where
    T: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    type Value = HashSet<T, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a set")
    }

    fn visit_seq<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: SeqAccess<'de>,
    {
        let values = match access.size_hint() {
            Some(size) => HashSet::with_capacity_and_hasher(size, S::default()),
            None => HashSet::default(),
        };

        {
            let values = values.pin();
            while let Some(value) = access.next_element()? {
                values.insert(value);
            }
        }

        Ok(values)
    }
}

#[cfg(test)]
mod test {
    use crate::HashSet;

    #[test]
    fn test_set() {
        let set: HashSet<u8> = HashSet::new();
        let guard = set.guard();

        set.insert(0, &guard);
        set.insert(1, &guard);
        set.insert(2, &guard);
        set.insert(3, &guard);
        set.insert(4, &guard);

        let serialized = serde_json::to_string(&set).unwrap();
        let deserialized = serde_json::from_str(&serialized).unwrap();

        assert_eq!(set, deserialized);
    }
}
