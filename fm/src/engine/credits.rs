//! Engine attribution

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credits {
    pub name: &'static str,
    pub author: &'static str,
    pub contact: &'static str,
    pub website: &'static str,
    pub license: &'static str,
    pub short_description: &'static str,
    pub long_description: &'static str,
}

pub const FMAP_CREDITS: Credits = Credits {
    name: "FMAP",
    author: "Alejandro Torreño, Oscar Sapena and Eva Onaindia",
    contact: "altorler@upvnet.upv.es, osapena@dsic.upv.es",
    website: "https://bitbucket.org/altorler/fmap/src/master/",
    license: "GPL",
    short_description: "FMAP: A Platform for the Development of Distributed Multi-Agent Planning Systems.",
    long_description: "FMAP uses a distributed heuristic search strategy. Each planning agent in the platform \
                       features an embedded search engine based on a forward partial-order planning scheme.",
};

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  Authors: {}", self.author)?;
        writeln!(f, "  Contact: {}", self.contact)?;
        writeln!(f, "  Website: {}", self.website)?;
        writeln!(f, "  License: {}", self.license)?;
        writeln!(f)?;
        writeln!(f, "{}", self.short_description)?;
        write!(f, "{}", self.long_description)
    }
}
