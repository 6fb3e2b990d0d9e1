/*!
General types.
*/

pub mod err;
