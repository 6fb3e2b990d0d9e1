/*!
The data model: terms, signatures, and variable environments.

The structures here are passive.
Resolution over them is implemented by [the procedures](crate::procedures), and storage by [the databases](crate::db).
*/

pub mod bindings;
pub mod term;
