//! An in-memory `DirectoryStore` double for resolver and scope tests.
//! Only the person/hierarchy surface is implemented; nothing else is
//! reachable from the code under test here.

use std::sync::{
  Mutex,
  atomic::{AtomicI64, Ordering},
};

use chrono::Utc;

use crate::{
  assignment::Ancestry,
  entities::{
    Cell, CellAttendance, CellId, Enrollment, Event, EventId, Guest, GuestId,
    GuestUpdate, ModuleId, NewAttendance, NewCell, NewEnrollment, NewEvent,
    NewGuest, NewModule, NewRegistration, Registration, SeminarModule,
  },
  person::{EdgeKind, NewPerson, Person, PersonId, PersonUpdate},
  store::DirectoryStore,
};

pub struct MemoryStore {
  persons: Mutex<Vec<Person>>,
  next_id: AtomicI64,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self { persons: Mutex::new(Vec::new()), next_id: AtomicI64::new(1) }
  }

  /// Synchronous insert helper for test setup.
  pub fn add(&self, input: NewPerson) -> Person {
    let person = Person {
      person_id:       self.next_id.fetch_add(1, Ordering::SeqCst),
      full_name:       input.full_name,
      email:           input.email,
      role:            input.role,
      leader_id:       input.leader_id,
      lider_doce_id:   input.lider_doce_id,
      lider_celula_id: input.lider_celula_id,
      pastor_id:       input.pastor_id,
      cell_id:         None,
      created_at:      Utc::now(),
    };
    self.persons.lock().unwrap().push(person.clone());
    person
  }

  /// Rewire one parent slot — used to build synthetic cycles.
  pub fn set_parent(
    &self,
    person_id: PersonId,
    kind: EdgeKind,
    parent: Option<PersonId>,
  ) {
    let mut persons = self.persons.lock().unwrap();
    let person = persons
      .iter_mut()
      .find(|p| p.person_id == person_id)
      .expect("person in store");
    match kind {
      EdgeKind::Leader => person.leader_id = parent,
      EdgeKind::LiderDoce => person.lider_doce_id = parent,
      EdgeKind::LiderCelula => person.lider_celula_id = parent,
      EdgeKind::Pastor => person.pastor_id = parent,
    }
  }
}

impl DirectoryStore for MemoryStore {
  type Error = std::convert::Infallible;

  async fn add_person(&self, input: NewPerson) -> Result<Person, Self::Error> {
    Ok(self.add(input))
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>, Self::Error> {
    Ok(
      self
        .persons
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.person_id == id)
        .cloned(),
    )
  }

  async fn list_persons(&self) -> Result<Vec<Person>, Self::Error> {
    Ok(self.persons.lock().unwrap().clone())
  }

  async fn find_credentials(
    &self,
    _email: &str,
  ) -> Result<Option<(Person, String)>, Self::Error> {
    unimplemented!()
  }

  async fn update_person(
    &self,
    _id: PersonId,
    _update: PersonUpdate,
  ) -> Result<Person, Self::Error> {
    unimplemented!()
  }

  async fn delete_person(&self, _id: PersonId) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn children_of(&self, id: PersonId) -> Result<Vec<PersonId>, Self::Error> {
    Ok(
      self
        .persons
        .lock()
        .unwrap()
        .iter()
        .filter(|p| {
          EdgeKind::ALL.iter().any(|kind| p.parent(*kind) == Some(id))
        })
        .map(|p| p.person_id)
        .collect(),
    )
  }

  async fn assign_leader(
    &self,
    _person_id: PersonId,
    _leader_id: PersonId,
    _ancestry: Ancestry,
  ) -> Result<Person, Self::Error> {
    unimplemented!()
  }

  async fn set_cell_membership(
    &self,
    _person_id: PersonId,
    _cell_id: Option<CellId>,
  ) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn add_guest(&self, _input: NewGuest) -> Result<Guest, Self::Error> {
    unimplemented!()
  }

  async fn get_guest(&self, _id: GuestId) -> Result<Option<Guest>, Self::Error> {
    unimplemented!()
  }

  async fn list_guests(&self) -> Result<Vec<Guest>, Self::Error> {
    unimplemented!()
  }

  async fn update_guest(
    &self,
    _id: GuestId,
    _update: GuestUpdate,
  ) -> Result<Guest, Self::Error> {
    unimplemented!()
  }

  async fn delete_guest(&self, _id: GuestId) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn add_cell(&self, _input: NewCell) -> Result<Cell, Self::Error> {
    unimplemented!()
  }

  async fn get_cell(&self, _id: CellId) -> Result<Option<Cell>, Self::Error> {
    unimplemented!()
  }

  async fn list_cells(&self) -> Result<Vec<Cell>, Self::Error> {
    unimplemented!()
  }

  async fn delete_cell(&self, _id: CellId) -> Result<(), Self::Error> {
    unimplemented!()
  }

  async fn record_attendance(
    &self,
    _input: NewAttendance,
  ) -> Result<CellAttendance, Self::Error> {
    unimplemented!()
  }

  async fn list_attendance(
    &self,
    _cell_id: CellId,
  ) -> Result<Vec<CellAttendance>, Self::Error> {
    unimplemented!()
  }

  async fn add_module(
    &self,
    _input: NewModule,
  ) -> Result<SeminarModule, Self::Error> {
    unimplemented!()
  }

  async fn get_module(
    &self,
    _id: ModuleId,
  ) -> Result<Option<SeminarModule>, Self::Error> {
    unimplemented!()
  }

  async fn list_modules(&self) -> Result<Vec<SeminarModule>, Self::Error> {
    unimplemented!()
  }

  async fn add_enrollment(
    &self,
    _input: NewEnrollment,
  ) -> Result<Enrollment, Self::Error> {
    unimplemented!()
  }

  async fn list_enrollments(
    &self,
    _person_id: Option<PersonId>,
  ) -> Result<Vec<Enrollment>, Self::Error> {
    unimplemented!()
  }

  async fn add_event(&self, _input: NewEvent) -> Result<Event, Self::Error> {
    unimplemented!()
  }

  async fn get_event(&self, _id: EventId) -> Result<Option<Event>, Self::Error> {
    unimplemented!()
  }

  async fn list_events(&self) -> Result<Vec<Event>, Self::Error> {
    unimplemented!()
  }

  async fn add_registration(
    &self,
    _input: NewRegistration,
  ) -> Result<Registration, Self::Error> {
    unimplemented!()
  }

  async fn list_registrations(
    &self,
    _event_id: EventId,
  ) -> Result<Vec<Registration>, Self::Error> {
    unimplemented!()
  }
}
