// -----------------------------------------------------------------------------------------------
// Coaly - context aware logging and tracing system
//
// Copyright (c) 2022, Frank Sommer.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// * Redistributions of source code must retain the above copyright notice, this
//   list of conditions and the following disclaimer.
//
// * Redistributions in binary form must reproduce the above copyright notice,
//   this list of conditions and the following disclaimer in the documentation
//   and/or other materials provided with the distribution.
//
// * Neither the name of the copyright holder nor the names of its
//   contributors may be used to endorse or promote products derived from
//   this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
// -----------------------------------------------------------------------------------------------

//! Small collection helpers shared by the registries.

use std::collections::BTreeMap;
use std::collections::btree_map::Values;
use std::fmt::{Debug, Formatter};

/// Generic type containing a map with custom elements, and a separate element
/// acting as default, if no custom elements exist.
#[derive(Clone)]
pub(crate) struct MapWithDefault<T> {
    default_element: T,
    custom_elements: BTreeMap<String, T>
} 
impl<T> MapWithDefault<T> {
    /// Returns the element with the given name.
    /// If the map doesn't contain one with that name, returns the default element.
    ///
    /// # Arguments
    /// * `name` - the element name
    #[inline]
    pub(crate) fn get(&self, name: &str) -> &T {
        self.custom_elements.get(name).unwrap_or(&self.default_element)
    }

    /// Returns the element with the given name.
    /// If the name is None or the map doesn't contain one with that name,
    /// returns the default element.
    ///
    /// # Arguments
    /// * `name` - the element name
    #[inline]
    pub(crate) fn find(&self, name: &Option<String>) -> &T {
        if let Some(n) = name { return self.get(n) }
        &self.default_element
    }

    /// Inserts a custom element into the map.
    /// 
    /// # Arguments
    /// * `name` - the name of the element
    /// * `desc` - the element
    ///
    /// # Return values
    /// the element in the map, that was replaced by the new one; **None**, if the map didn't
    /// contain an element with the specified key
    #[inline]
    pub(crate) fn insert(&mut self, name: &str, element: T) -> Option<T> {
        self.custom_elements.insert(name.to_string(), element)
    }

    /// Returns an iterator over the custom values of the map.
    #[inline]
    pub(crate) fn custom_values(&self) -> Values<String, T> {
        self.custom_elements.values()
    }

    /// Indicates whether the given name has an explicitly registered custom element,
    /// as opposed to silently falling back to the default.
    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.custom_elements.contains_key(name)
    }
}
impl<T: Default> Default for MapWithDefault<T> {
    fn default() -> Self {
        MapWithDefault {
            default_element: T::default(),
            custom_elements: BTreeMap::<String, T>::new()
        }
    }
}
impl<T: Debug> Debug for MapWithDefault<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut buf = String::with_capacity(512);
        for (fmt_name, fmt) in self.custom_elements.iter() {
            if ! buf.is_empty() { buf.push(','); }
            buf.push_str(&format!("{{{}:{:?}}}", fmt_name, fmt));
        }
        write!(f, "DEF:{{{:?}}}/CUST:{}", self.default_element, buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Clone,PartialEq)]
    struct TestStruct {
        name: String,
        value: u32
    }
    impl Default for TestStruct {
        fn default() -> Self {
            TestStruct {
                name: String::from("default"),
                value: 0
            }
        }
    }
    impl Debug for TestStruct {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "VAL:{}", self.value)
        }
    }

    #[test]
    fn test_map_with_default() {
        // empty map
        let map = MapWithDefault::<TestStruct>::default();
        assert_eq!("DEF:{VAL:0}/CUST:", &format!("{:?}", &map));
        assert!(map.custom_values().clone().next().is_none());
        assert_eq!(TestStruct::default(), *map.get("xyz"));
        assert_eq!(TestStruct::default(), *map.find(&Some(String::from("xyz"))));
        assert_eq!(TestStruct::default(), *map.find(&None));
        assert!(! map.contains("xyz"));

        // map with custom element
        let mut map = MapWithDefault::<TestStruct>::default();
        let cust_elem = TestStruct { name: String::from("custom"), value: 123 };
        map.insert("custom", cust_elem.clone());
        assert_eq!("DEF:{VAL:0}/CUST:{custom:VAL:123}", &format!("{:?}", &map));
        assert!(map.custom_values().clone().next().is_some());
        assert_eq!(TestStruct::default(), *map.get("xyz"));
        assert_eq!(cust_elem, *map.find(&Some(String::from("custom"))));
        assert_eq!(TestStruct::default(), *map.find(&Some(String::from("xyz"))));
        assert_eq!(TestStruct::default(), *map.find(&None));
        assert!(map.contains("custom"));
        assert!(! map.contains("xyz"));
    }
}