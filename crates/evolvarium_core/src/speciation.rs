//! World-wide species clustering by genetic distance.
//!
//! Species are emergent clusters, tracked independently of any single
//! population. Membership is refreshed periodically by greedy
//! nearest-representative assignment: each living entity joins the closest
//! active species within the distance threshold (ties resolved by lowest
//! species id), or founds a new species with itself as representative.
//! Representatives are then re-centred on member centroids. Extinction is
//! single-shot: once a species' member set stays empty across the grace
//! window it flips to extinct exactly once and stays in the historical set.

use evolvarium_data::{Entity, Genome, Species};
use std::collections::BTreeMap;

use crate::events::{timestamp_now, LiveEvent};
use crate::genetics::GenomeLogic;
use crate::naming::species_display_name;

pub struct SpeciationSystem {
    /// Every species ever formed, extinct ones included, ascending by id.
    pub species: Vec<Species>,
    /// Maximum genetic distance for cluster membership.
    pub distance_threshold: f64,
    /// Membership refresh period in ticks.
    pub update_interval: u64,
    /// Refresh ticks a species may sit empty before extinction.
    pub extinction_grace: u64,
    next_species_id: u64,
}

impl SpeciationSystem {
    #[must_use]
    pub fn new(distance_threshold: f64, update_interval: u64, extinction_grace: u64) -> Self {
        Self {
            species: Vec::new(),
            distance_threshold,
            update_interval: update_interval.max(1),
            extinction_grace,
            next_species_id: 0,
        }
    }

    /// Founds a species up front with a known representative genome; used
    /// when a population is seeded so its entities share a cluster from
    /// tick zero. Returns the generated display name and a formation event.
    pub fn found_species(
        &mut self,
        label: &str,
        representative: Genome,
        founder: u64,
        tick: u64,
    ) -> (String, LiveEvent) {
        let id = self.next_species_id;
        self.next_species_id += 1;
        let name = species_display_name(label, id);
        self.species.push(Species {
            id,
            name: name.clone(),
            representative,
            members: vec![founder],
            formation_tick: tick,
            extinction_tick: 0,
            peak_population: 1,
            is_extinct: false,
            empty_since: None,
        });
        let event = LiveEvent::SpeciesFormed {
            species_id: id,
            name: name.clone(),
            founder,
            tick,
            timestamp: timestamp_now(),
        };
        (name, event)
    }

    /// Runs a refresh if the tick lands on the update period.
    pub fn update<'a, I>(&mut self, tick: u64, entities: I) -> Vec<LiveEvent>
    where
        I: IntoIterator<Item = &'a mut Entity>,
    {
        if tick % self.update_interval != 0 {
            return Vec::new();
        }
        self.refresh(tick, entities)
    }

    /// Re-evaluates membership for every living entity and updates species
    /// bookkeeping, regardless of the update period.
    pub fn refresh<'a, I>(&mut self, tick: u64, entities: I) -> Vec<LiveEvent>
    where
        I: IntoIterator<Item = &'a mut Entity>,
    {
        let mut events = Vec::new();

        for sp in &mut self.species {
            sp.members.clear();
        }

        for entity in entities {
            if !entity.is_alive {
                continue;
            }
            // Greedy nearest representative; ascending-id scan with a
            // strict improvement test keeps the lowest id on ties.
            let mut best: Option<(usize, f64)> = None;
            for (idx, sp) in self.species.iter().enumerate() {
                if sp.is_extinct {
                    continue;
                }
                let dist = entity.genome.distance(&sp.representative);
                if dist <= self.distance_threshold
                    && best.map_or(true, |(_, best_dist)| dist < best_dist)
                {
                    best = Some((idx, dist));
                }
            }
            match best {
                Some((idx, _)) => {
                    let sp = &mut self.species[idx];
                    sp.members.push(entity.id);
                    entity.species = sp.name.clone();
                }
                None => {
                    let (name, event) = self.found_species(
                        &entity.species,
                        entity.genome.clone(),
                        entity.id,
                        tick,
                    );
                    entity.species = name;
                    events.push(event);
                }
            }
        }

        events.extend(self.finish_refresh(tick));
        events
    }

    /// Post-assignment bookkeeping: peak counts, empty/extinction windows.
    fn finish_refresh(&mut self, tick: u64) -> Vec<LiveEvent> {
        let mut events = Vec::new();
        for sp in &mut self.species {
            if sp.is_extinct {
                continue;
            }
            let count = sp.members.len();
            if count > sp.peak_population {
                sp.peak_population = count;
            }
            if count == 0 {
                let since = *sp.empty_since.get_or_insert(tick);
                if tick.saturating_sub(since) >= self.extinction_grace {
                    sp.is_extinct = true;
                    sp.extinction_tick = tick;
                    events.push(LiveEvent::SpeciesExtinct {
                        species_id: sp.id,
                        name: sp.name.clone(),
                        peak_population: sp.peak_population,
                        tick,
                        timestamp: timestamp_now(),
                    });
                }
            } else {
                sp.empty_since = None;
            }
        }
        events
    }

    /// Recentres each active species' representative on the centroid of
    /// its members' genomes. Traits are averaged over the members that
    /// carry them.
    pub fn recentre_representatives(&mut self, genomes_by_id: &BTreeMap<u64, Genome>) {
        for sp in &mut self.species {
            if sp.is_extinct || sp.members.is_empty() {
                continue;
            }
            let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
            for member in &sp.members {
                if let Some(genome) = genomes_by_id.get(member) {
                    for (name, value) in genome.entries() {
                        let entry = sums.entry(name.to_string()).or_insert((0.0, 0));
                        entry.0 += value;
                        entry.1 += 1;
                    }
                }
            }
            let mut centroid = Genome::new();
            for (name, (sum, count)) in sums {
                centroid.set(&name, sum / count as f64);
            }
            if !centroid.is_empty() {
                sp.representative = centroid;
            }
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.species.iter().filter(|s| s.is_active()).count()
    }

    #[must_use]
    pub fn extinct_count(&self) -> usize {
        self.species.iter().filter(|s| s.is_extinct).count()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    /// Active species a genome would currently be assigned to, if any.
    #[must_use]
    pub fn nearest_species(&self, genome: &Genome) -> Option<&Species> {
        let mut best: Option<(&Species, f64)> = None;
        for sp in &self.species {
            if sp.is_extinct {
                continue;
            }
            let dist = genome.distance(&sp.representative);
            if dist <= self.distance_threshold
                && best.map_or(true, |(_, best_dist)| dist < best_dist)
            {
                best = Some((sp, dist));
            }
        }
        best.map(|(sp, _)| sp)
    }
}
