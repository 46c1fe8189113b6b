use crate::{
    model::{EnumerableOps, TypeSpec},
    traits::{Node, Reflect},
    value::Value,
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::Hash,
};

// ============================================================================
// SEQUENCES
// ============================================================================

impl<T: Reflect> Reflect for Vec<T> {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::sequence::<Self, T>(EnumerableOps {
            elements: vec_elements::<T>,
            collect: collect_vec::<T>,
        })
    }

    fn to_value(&self) -> Option<Value> {
        list_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::List(items) = value else {
            return None;
        };

        items.into_iter().map(T::from_value).collect()
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::sequence::<Self, T>(EnumerableOps {
            elements: deque_elements::<T>,
            collect: collect_deque::<T>,
        })
    }

    fn to_value(&self) -> Option<Value> {
        list_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        Vec::<T>::from_value(value).map(Self::from)
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::sequence::<Self, T>(EnumerableOps {
            elements: array_elements::<T, N>,
            collect: collect_array::<T, N>,
        })
    }

    fn to_value(&self) -> Option<Value> {
        list_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        Vec::<T>::from_value(value)?.try_into().ok()
    }

    fn construct() -> Option<Self> {
        (0..N)
            .map(|_| T::construct())
            .collect::<Option<Vec<T>>>()?
            .try_into()
            .ok()
    }
}

fn vec_elements<T: Reflect>(node: &Node) -> Option<Vec<Option<&Node>>> {
    let items = node.downcast_ref::<Vec<T>>()?;

    Some(items.iter().map(T::as_node).collect())
}

fn deque_elements<T: Reflect>(node: &Node) -> Option<Vec<Option<&Node>>> {
    let items = node.downcast_ref::<VecDeque<T>>()?;

    Some(items.iter().map(T::as_node).collect())
}

fn array_elements<T: Reflect, const N: usize>(node: &Node) -> Option<Vec<Option<&Node>>> {
    let items = node.downcast_ref::<[T; N]>()?;

    Some(items.iter().map(T::as_node).collect())
}

fn collect_vec<T: Reflect>(items: Vec<Box<Node>>) -> Option<Box<Node>> {
    collect_items::<T>(items)?.into_node()
}

fn collect_deque<T: Reflect>(items: Vec<Box<Node>>) -> Option<Box<Node>> {
    VecDeque::from(collect_items::<T>(items)?).into_node()
}

fn collect_array<T: Reflect, const N: usize>(items: Vec<Box<Node>>) -> Option<Box<Node>> {
    let array: [T; N] = collect_items::<T>(items)?.try_into().ok()?;

    array.into_node()
}

// ============================================================================
// SETS
// ============================================================================

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::set::<Self, T>(EnumerableOps {
            elements: hash_set_elements::<T>,
            collect: collect_hash_set::<T>,
        })
    }

    fn to_value(&self) -> Option<Value> {
        list_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        Vec::<T>::from_value(value).map(|items| items.into_iter().collect())
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::set::<Self, T>(EnumerableOps {
            elements: btree_set_elements::<T>,
            collect: collect_btree_set::<T>,
        })
    }

    fn to_value(&self) -> Option<Value> {
        list_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        Vec::<T>::from_value(value).map(|items| items.into_iter().collect())
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

fn hash_set_elements<T: Reflect + Eq + Hash>(node: &Node) -> Option<Vec<Option<&Node>>> {
    let items = node.downcast_ref::<HashSet<T>>()?;

    Some(items.iter().map(T::as_node).collect())
}

fn btree_set_elements<T: Reflect + Ord>(node: &Node) -> Option<Vec<Option<&Node>>> {
    let items = node.downcast_ref::<BTreeSet<T>>()?;

    Some(items.iter().map(T::as_node).collect())
}

fn collect_hash_set<T: Reflect + Eq + Hash>(items: Vec<Box<Node>>) -> Option<Box<Node>> {
    collect_items::<T>(items)?
        .into_iter()
        .collect::<HashSet<T>>()
        .into_node()
}

fn collect_btree_set<T: Reflect + Ord>(items: Vec<Box<Node>>) -> Option<Box<Node>> {
    collect_items::<T>(items)?
        .into_iter()
        .collect::<BTreeSet<T>>()
        .into_node()
}

// ============================================================================
// DICTIONARIES
// ============================================================================
//
// Dictionaries are enumerable but copied whole as `Value::Map`; element
// cursors over entries are not provided.
//

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
{
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::dictionary::<Self, K, V>()
    }

    fn to_value(&self) -> Option<Value> {
        map_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        map_entries::<K, V>(value).map(|entries| entries.into_iter().collect())
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Ord,
    V: Reflect,
{
    type Member = Self;

    fn type_spec() -> TypeSpec {
        TypeSpec::dictionary::<Self, K, V>()
    }

    fn to_value(&self) -> Option<Value> {
        map_value(self.iter())
    }

    fn from_value(value: Value) -> Option<Self> {
        map_entries::<K, V>(value).map(|entries| entries.into_iter().collect())
    }

    fn construct() -> Option<Self> {
        Some(Self::new())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn collect_items<T: Reflect>(items: Vec<Box<Node>>) -> Option<Vec<T>> {
    items.into_iter().map(T::from_node).collect()
}

fn list_value<'a, T: Reflect>(items: impl Iterator<Item = &'a T>) -> Option<Value> {
    items
        .map(Reflect::to_value)
        .collect::<Option<Vec<_>>>()
        .map(Value::List)
}

fn map_value<'a, K: Reflect, V: Reflect>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Option<Value> {
    entries
        .map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
        .collect::<Option<Vec<_>>>()
        .map(Value::Map)
}

fn map_entries<K: Reflect, V: Reflect>(value: Value) -> Option<Vec<(K, V)>> {
    let Value::Map(entries) = value else {
        return None;
    };

    entries
        .into_iter()
        .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
        .collect()
}
